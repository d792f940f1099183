use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, FromRow)]
pub struct ExpenseActivityRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub trip_name: String,
    pub title: String,
    pub total: sqlx::types::Decimal,
    pub paid_by: Uuid,
    pub paid_by_username: String,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct PaymentActivityRow {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub trip_name: String,
    pub from_user_id: Uuid,
    pub from_username: String,
    pub to_user_id: Uuid,
    pub to_username: String,
    pub amount: sqlx::types::Decimal,
    pub method: Option<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

pub async fn recent_expenses(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<ExpenseActivityRow>> {
    let rows = sqlx::query_as::<_, ExpenseActivityRow>(
        r#"
        SELECT e.id, e.trip_id, t.name AS trip_name, e.title, e.total,
               e.paid_by, u.username AS paid_by_username, e.created_at
        FROM expenses e
        JOIN trips t ON t.id = e.trip_id
        JOIN users u ON u.id = e.paid_by
        JOIN trip_members tm ON tm.trip_id = e.trip_id AND tm.user_id = $1
        ORDER BY e.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn recent_payments(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<PaymentActivityRow>> {
    let rows = sqlx::query_as::<_, PaymentActivityRow>(
        r#"
        SELECT p.id, p.trip_id, t.name AS trip_name,
               p.from_user_id, fu.username AS from_username,
               p.to_user_id,   tu.username AS to_username,
               p.amount, p.method, p.status, p.created_at
        FROM payments p
        JOIN trips t ON t.id = p.trip_id
        JOIN users fu ON fu.id = p.from_user_id
        JOIN users tu ON tu.id = p.to_user_id
        JOIN trip_members tm ON tm.trip_id = p.trip_id AND tm.user_id = $1
        ORDER BY p.created_at DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
