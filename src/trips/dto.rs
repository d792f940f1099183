use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::expenses::dto::ExpenseResponse;
use crate::payments::dto::PaymentResponse;
use crate::trips::repo_types::{Trip, TripMember};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTripRequest {
    pub name: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripRequest {
    pub name: Option<String>,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteMemberRequest {
    pub username: String,
}

/// Trip list entry with the caller-facing aggregates.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: Uuid,
    pub name: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub total_amount: f64,
    pub expense_count: i64,
    pub user_balance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMemberResponse {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
    pub joined_at: OffsetDateTime,
}

impl From<TripMember> for TripMemberResponse {
    fn from(m: TripMember) -> Self {
        Self {
            user_id: m.user_id,
            username: m.username,
            role: m.role,
            joined_at: m.joined_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDetail {
    pub id: Uuid,
    pub name: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub status: String,
    pub created_at: OffsetDateTime,
    pub members: Vec<TripMemberResponse>,
    pub expenses: Vec<ExpenseResponse>,
    pub payments: Vec<PaymentResponse>,
    pub balances: Vec<BalanceEntry>,
    pub settlements: Vec<SettlementEntry>,
    pub user_balance: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub user_id: Uuid,
    pub username: String,
    pub balance: f64,
    pub settled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementEntry {
    pub from_user_id: Uuid,
    pub from_username: String,
    pub to_user_id: Uuid,
    pub to_username: String,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancesResponse {
    pub user_balance: f64,
    pub balances: Vec<BalanceEntry>,
    pub settlements: Vec<SettlementEntry>,
    pub total_settled: f64,
    pub payment_count: i64,
}

pub use crate::trips::repo_types::TripInvite as TripInviteResponse;

impl Trip {
    pub fn into_summary(self, total_amount: f64, expense_count: i64, user_balance: f64) -> TripSummary {
        TripSummary {
            id: self.id,
            name: self.name,
            start_date: self.start_date,
            end_date: self.end_date,
            status: self.status,
            created_at: self.created_at,
            total_amount,
            expense_count,
            user_balance,
        }
    }
}
