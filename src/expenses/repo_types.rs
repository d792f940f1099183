use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Expense row as stored. `amount` mirrors `total` and is kept for older
/// clients that predate the subtotal/tax/tip breakdown.
#[derive(Debug, Clone, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub paid_by: Uuid,
    pub title: String,
    pub amount: sqlx::types::Decimal,
    pub subtotal: sqlx::types::Decimal,
    pub tax: sqlx::types::Decimal,
    pub tip: sqlx::types::Decimal,
    pub total: sqlx::types::Decimal,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExpenseSplit {
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub share: sqlx::types::Decimal,
}
