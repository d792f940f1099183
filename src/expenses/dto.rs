use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Expense creation payload. Simple splits carry `amount` + `splits`;
/// itemized receipts carry `items` (+ optional `tax`/`tip`). The two shapes
/// are discriminated by the presence of `items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub title: String,
    pub amount: Option<f64>,
    pub splits: Option<Vec<SplitInput>>,
    pub items: Option<Vec<ItemInput>>,
    pub tax: Option<f64>,
    pub tip: Option<TipInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitInput {
    pub user_id: Uuid,
    pub share: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemInput {
    pub name: String,
    pub price: f64,
    pub assigned_user_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "value")]
pub enum TipInput {
    #[serde(rename = "percent")]
    Percent(f64),
    #[serde(rename = "amount")]
    Amount(f64),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub paid_by_id: Uuid,
    pub title: String,
    pub amount: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub tip: f64,
    pub total: f64,
    pub created_at: OffsetDateTime,
    pub splits: Vec<SplitResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitResponse {
    pub user_id: Uuid,
    pub share: f64,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}
