use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// One side of a friendship, joined with the friend's public info.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub user_id: Uuid,
    pub username: String,
    pub created_at: OffsetDateTime,
}

/// Friend invite joined with both usernames.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendInvite {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_username: String,
    pub receiver_id: Uuid,
    pub receiver_username: String,
    pub status: String,
    pub created_at: OffsetDateTime,
}
