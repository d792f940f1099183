use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use crate::expenses::engine::ComputedExpense;
use crate::expenses::repo_types::{Expense, ExpenseSplit};
use crate::money::cents_to_decimal;

/// Persist an expense with its items, assignments and splits in one
/// transaction. Nothing is committed unless every row lands.
pub async fn create(
    db: &PgPool,
    trip_id: Uuid,
    paid_by: Uuid,
    title: &str,
    computed: &ComputedExpense,
) -> anyhow::Result<Expense> {
    let mut tx = db.begin().await?;

    let expense = sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses (trip_id, paid_by, title, amount, subtotal, tax, tip, total)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $4)
        RETURNING id, trip_id, paid_by, title, amount, subtotal, tax, tip, total, created_at
        "#,
    )
    .bind(trip_id)
    .bind(paid_by)
    .bind(title)
    .bind(cents_to_decimal(computed.total))
    .bind(cents_to_decimal(computed.subtotal))
    .bind(cents_to_decimal(computed.tax))
    .bind(cents_to_decimal(computed.tip))
    .fetch_one(&mut *tx)
    .await
    .context("insert expense")?;

    for item in &computed.items {
        let item_id: (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO expense_items (expense_id, name, price)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(expense.id)
        .bind(&item.name)
        .bind(cents_to_decimal(item.price))
        .fetch_one(&mut *tx)
        .await
        .context("insert expense item")?;

        for user_id in &item.assignees {
            sqlx::query(
                r#"
                INSERT INTO expense_item_assignments (item_id, user_id)
                VALUES ($1, $2)
                ON CONFLICT (item_id, user_id) DO NOTHING
                "#,
            )
            .bind(item_id.0)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("insert item assignment")?;
        }
    }

    for (user_id, share) in &computed.shares {
        sqlx::query(
            r#"
            INSERT INTO expense_splits (expense_id, user_id, share)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(expense.id)
        .bind(user_id)
        .bind(cents_to_decimal(*share))
        .execute(&mut *tx)
        .await
        .context("insert expense split")?;
    }

    tx.commit().await?;
    Ok(expense)
}

pub async fn list_for_trip(db: &PgPool, trip_id: Uuid) -> anyhow::Result<Vec<Expense>> {
    let rows = sqlx::query_as::<_, Expense>(
        r#"
        SELECT id, trip_id, paid_by, title, amount, subtotal, tax, tip, total, created_at
        FROM expenses
        WHERE trip_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(trip_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn list_for_trip_paged(
    db: &PgPool,
    trip_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Expense>> {
    let rows = sqlx::query_as::<_, Expense>(
        r#"
        SELECT id, trip_id, paid_by, title, amount, subtotal, tax, tip, total, created_at
        FROM expenses
        WHERE trip_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(trip_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Splits for one specific set of expenses.
pub async fn splits_for_expenses(
    db: &PgPool,
    expense_ids: &[Uuid],
) -> anyhow::Result<Vec<ExpenseSplit>> {
    let rows = sqlx::query_as::<_, ExpenseSplit>(
        r#"
        SELECT expense_id, user_id, share
        FROM expense_splits
        WHERE expense_id = ANY($1)
        "#,
    )
    .bind(expense_ids)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// All split rows for a trip's expenses, for the balance fold.
pub async fn splits_for_trip(db: &PgPool, trip_id: Uuid) -> anyhow::Result<Vec<ExpenseSplit>> {
    let rows = sqlx::query_as::<_, ExpenseSplit>(
        r#"
        SELECT s.expense_id, s.user_id, s.share
        FROM expense_splits s
        JOIN expenses e ON e.id = s.expense_id
        WHERE e.trip_id = $1
        "#,
    )
    .bind(trip_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
