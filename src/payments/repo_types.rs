use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_DECLINED: &str = "declined";

/// Payment row as stored.
#[derive(Debug, Clone, FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub amount: sqlx::types::Decimal,
    pub method: Option<String>,
    pub status: String,
    pub decline_note: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Payment joined with both counterparties' usernames.
#[derive(Debug, Clone, FromRow)]
pub struct PaymentWithUsers {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub from_user_id: Uuid,
    pub from_username: String,
    pub to_user_id: Uuid,
    pub to_username: String,
    pub amount: sqlx::types::Decimal,
    pub method: Option<String>,
    pub status: String,
    pub decline_note: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}
