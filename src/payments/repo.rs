use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::payments::repo_types::{Payment, PaymentWithUsers};

const SELECT_WITH_USERS: &str = r#"
    SELECT p.id, p.trip_id,
           p.from_user_id, fu.username AS from_username,
           p.to_user_id,   tu.username AS to_username,
           p.amount, p.method, p.status, p.decline_note,
           p.created_at, p.updated_at
    FROM payments p
    JOIN users fu ON fu.id = p.from_user_id
    JOIN users tu ON tu.id = p.to_user_id
"#;

pub async fn create(
    db: &PgPool,
    trip_id: Uuid,
    from_user_id: Uuid,
    to_user_id: Uuid,
    amount: Decimal,
    method: Option<&str>,
) -> anyhow::Result<PaymentWithUsers> {
    let id: (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO payments (trip_id, from_user_id, to_user_id, amount, method)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(trip_id)
    .bind(from_user_id)
    .bind(to_user_id)
    .bind(amount)
    .bind(method)
    .fetch_one(db)
    .await?;

    let payment =
        sqlx::query_as::<_, PaymentWithUsers>(&format!("{} WHERE p.id = $1", SELECT_WITH_USERS))
            .bind(id.0)
            .fetch_one(db)
            .await?;
    Ok(payment)
}

pub async fn find_with_users(db: &PgPool, payment_id: Uuid) -> anyhow::Result<PaymentWithUsers> {
    let payment =
        sqlx::query_as::<_, PaymentWithUsers>(&format!("{} WHERE p.id = $1", SELECT_WITH_USERS))
            .bind(payment_id)
            .fetch_one(db)
            .await?;
    Ok(payment)
}

pub async fn find(db: &PgPool, payment_id: Uuid) -> anyhow::Result<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, trip_id, from_user_id, to_user_id, amount, method,
               status, decline_note, created_at, updated_at
        FROM payments
        WHERE id = $1
        "#,
    )
    .bind(payment_id)
    .fetch_optional(db)
    .await?;
    Ok(payment)
}

pub async fn list_for_trip(db: &PgPool, trip_id: Uuid) -> anyhow::Result<Vec<PaymentWithUsers>> {
    let rows = sqlx::query_as::<_, PaymentWithUsers>(&format!(
        "{} WHERE p.trip_id = $1 ORDER BY p.created_at DESC",
        SELECT_WITH_USERS
    ))
    .bind(trip_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn pending_for_receiver(
    db: &PgPool,
    to_user_id: Uuid,
) -> anyhow::Result<Vec<PaymentWithUsers>> {
    let rows = sqlx::query_as::<_, PaymentWithUsers>(&format!(
        "{} WHERE p.to_user_id = $1 AND p.status = 'pending' ORDER BY p.created_at DESC",
        SELECT_WITH_USERS
    ))
    .bind(to_user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// `pending → confirmed`, guarded in the WHERE clause so a concurrent
/// transition loses with zero rows affected instead of overwriting.
pub async fn confirm(db: &PgPool, payment_id: Uuid, to_user_id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'confirmed', updated_at = now()
        WHERE id = $1 AND to_user_id = $2 AND status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(to_user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// `pending → declined`, same guard as `confirm`.
pub async fn decline(
    db: &PgPool,
    payment_id: Uuid,
    to_user_id: Uuid,
    note: Option<&str>,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE payments
        SET status = 'declined', decline_note = $3, updated_at = now()
        WHERE id = $1 AND to_user_id = $2 AND status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(to_user_id)
    .bind(note)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Senders may remove their own payment, but only while it is still pending.
pub async fn delete_pending(
    db: &PgPool,
    payment_id: Uuid,
    from_user_id: Uuid,
) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM payments
        WHERE id = $1 AND from_user_id = $2 AND status = 'pending'
        "#,
    )
    .bind(payment_id)
    .bind(from_user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
