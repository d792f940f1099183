use serde::Serialize;
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub const TRIP_STATUSES: [&str; 4] = ["planning", "active", "completed", "cancelled"];

pub fn is_valid_status(status: &str) -> bool {
    TRIP_STATUSES.contains(&status)
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub name: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

/// Trip membership joined with the member's public info.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TripMember {
    pub trip_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub joined_at: OffsetDateTime,
}

/// Trip invite joined with trip and inviter projections for the invitee's
/// inbox.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TripInvite {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub trip_name: String,
    pub inviter_id: Uuid,
    pub inviter_username: String,
    pub invitee_id: Uuid,
    pub status: String,
    pub created_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_four_statuses_are_accepted() {
        for status in ["planning", "active", "completed", "cancelled"] {
            assert!(is_valid_status(status));
        }
        assert!(!is_valid_status("archived"));
        assert!(!is_valid_status(""));
    }
}
