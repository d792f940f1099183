use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::money::{decimal_to_cents, from_cents};
use crate::payments::repo_types::PaymentWithUsers;

/// Counterparty is resolved by explicit id or by username.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub to_user_id: Option<Uuid>,
    pub to_username: Option<String>,
    pub amount: f64,
    pub method: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeclineRequest {
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub from_user_id: Uuid,
    pub from_username: String,
    pub to_user_id: Uuid,
    pub to_username: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_note: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PaymentWithUsers> for PaymentResponse {
    fn from(p: PaymentWithUsers) -> Self {
        Self {
            id: p.id,
            trip_id: p.trip_id,
            from_user_id: p.from_user_id,
            from_username: p.from_username,
            to_user_id: p.to_user_id,
            to_username: p.to_username,
            amount: from_cents(decimal_to_cents(p.amount)),
            method: p.method,
            status: p.status,
            decline_note: p.decline_note,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}
