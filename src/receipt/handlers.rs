use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::{AppError, Result};
use crate::receipt::parser::{parse_receipt, ParsedReceipt};
use crate::state::AppState;
use crate::trips;

pub fn routes() -> Router<AppState> {
    Router::new().route("/trips/:id/receipt/ocr", post(parse_ocr))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrRequest {
    pub raw_text: String,
}

/// Parse OCR text into a candidate itemization. Nothing is persisted; the
/// client reviews the result and resubmits it as an itemized expense.
#[instrument(skip(state, payload), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn parse_ocr(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<OcrRequest>,
) -> Result<Json<ParsedReceipt>> {
    trips::repo::ensure_member(&state.db, trip_id, user_id).await?;

    if payload.raw_text.trim().is_empty() {
        return Err(AppError::Validation("rawText must be non-empty".into()));
    }

    let parsed = parse_receipt(&payload.raw_text);
    let result = match state.verifier.verify(&payload.raw_text, &parsed).await {
        Some(verified) => verified,
        None => parsed,
    };

    info!(
        items = result.items.len(),
        confidence = result.confidence,
        source = %result.source,
        "receipt parsed"
    );
    Ok(Json(result))
}
