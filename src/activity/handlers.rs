use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::activity::repo;
use crate::auth::jwt::AuthUser;
use crate::error::Result;
use crate::money::{decimal_to_cents, from_cents};
use crate::state::AppState;

/// The feed never grows past this many events per request.
const FEED_LIMIT: usize = 30;

pub fn routes() -> Router<AppState> {
    Router::new().route("/activity", get(get_activity))
}

/// One feed entry. Expense and payment events carry the identities the
/// client needs to render "You paid @x" versus "@x paid you"; declined
/// payments stay visible and the client decides styling.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ActivityEvent {
    #[serde(rename_all = "camelCase")]
    Expense {
        id: Uuid,
        trip_id: Uuid,
        trip_name: String,
        title: String,
        amount: f64,
        paid_by_id: Uuid,
        paid_by_username: String,
        created_at: OffsetDateTime,
    },
    #[serde(rename_all = "camelCase")]
    Payment {
        id: Uuid,
        trip_id: Uuid,
        trip_name: String,
        from_user_id: Uuid,
        from_username: String,
        to_user_id: Uuid,
        to_username: String,
        amount: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        method: Option<String>,
        status: String,
        created_at: OffsetDateTime,
    },
}

impl ActivityEvent {
    fn created_at(&self) -> OffsetDateTime {
        match self {
            ActivityEvent::Expense { created_at, .. } => *created_at,
            ActivityEvent::Payment { created_at, .. } => *created_at,
        }
    }
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_activity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ActivityEvent>>> {
    let expenses = repo::recent_expenses(&state.db, user_id, FEED_LIMIT as i64).await?;
    let payments = repo::recent_payments(&state.db, user_id, FEED_LIMIT as i64).await?;

    let mut events: Vec<ActivityEvent> = Vec::with_capacity(expenses.len() + payments.len());

    for e in expenses {
        events.push(ActivityEvent::Expense {
            id: e.id,
            trip_id: e.trip_id,
            trip_name: e.trip_name,
            title: e.title,
            amount: from_cents(decimal_to_cents(e.total)),
            paid_by_id: e.paid_by,
            paid_by_username: e.paid_by_username,
            created_at: e.created_at,
        });
    }
    for p in payments {
        events.push(ActivityEvent::Payment {
            id: p.id,
            trip_id: p.trip_id,
            trip_name: p.trip_name,
            from_user_id: p.from_user_id,
            from_username: p.from_username,
            to_user_id: p.to_user_id,
            to_username: p.to_username,
            amount: from_cents(decimal_to_cents(p.amount)),
            method: p.method,
            status: p.status,
            created_at: p.created_at,
        });
    }

    events.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    events.truncate(FEED_LIMIT);

    Ok(Json(events))
}
