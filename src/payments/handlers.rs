use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::User;
use crate::error::{AppError, Result};
use crate::money::{cents_to_decimal, to_cents};
use crate::payments::dto::{CreatePaymentRequest, DeclineRequest, PaymentResponse};
use crate::payments::repo;
use crate::payments::repo_types::Payment;
use crate::state::AppState;
use crate::trips;

const MAX_DECLINE_NOTE: usize = 200;

pub fn trip_routes() -> Router<AppState> {
    Router::new().route("/trips/:id/payments", post(create_payment))
}

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/pending", get(pending_payments))
        .route("/payments/:id/confirm", post(confirm_payment))
        .route("/payments/:id/decline", post(decline_payment))
        .route("/payments/:id", delete(delete_payment))
}

#[instrument(skip(state, payload), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn create_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<CreatePaymentRequest>,
) -> Result<Json<PaymentResponse>> {
    trips::repo::ensure_member(&state.db, trip_id, user_id).await?;

    let to_user = match (payload.to_user_id, payload.to_username.as_deref()) {
        (Some(id), _) => User::find_by_id(&state.db, id)
            .await?
            .ok_or(AppError::NotFound("recipient not found".into()))?,
        (None, Some(username)) => User::find_by_username(&state.db, username.trim())
            .await?
            .ok_or(AppError::NotFound("recipient not found".into()))?,
        (None, None) => {
            return Err(AppError::Validation(
                "toUserId or toUsername is required".into(),
            ))
        }
    };

    if to_user.id == user_id {
        return Err(AppError::Validation("cannot pay yourself".into()));
    }
    if !trips::repo::is_member(&state.db, trip_id, to_user.id).await? {
        return Err(AppError::Validation(
            "recipient is not a member of this trip".into(),
        ));
    }

    let amount_c = to_cents(payload.amount);
    if amount_c <= 0 {
        return Err(AppError::Validation("amount must be positive".into()));
    }

    let payment = repo::create(
        &state.db,
        trip_id,
        user_id,
        to_user.id,
        cents_to_decimal(amount_c),
        payload.method.as_deref(),
    )
    .await?;

    info!(payment_id = %payment.id, to_user_id = %to_user.id, "payment recorded");
    Ok(Json(payment.into()))
}

/// Load a payment and check the caller is the expected counterparty.
async fn load_for_counterparty(
    state: &AppState,
    payment_id: Uuid,
    caller: Uuid,
    receiver_side: bool,
) -> Result<Payment> {
    let payment = repo::find(&state.db, payment_id)
        .await?
        .ok_or(AppError::NotFound("payment not found".into()))?;

    let expected = if receiver_side {
        payment.to_user_id
    } else {
        payment.from_user_id
    };
    if caller != expected {
        let role = if receiver_side { "receiver" } else { "sender" };
        warn!(payment_id = %payment_id, "wrong counterparty");
        return Err(AppError::Forbidden(format!(
            "only the {} can perform this action",
            role
        )));
    }
    Ok(payment)
}

/// The transition raced and lost; report the state the winner left behind.
async fn already_terminal(state: &AppState, payment_id: Uuid) -> AppError {
    match repo::find(&state.db, payment_id).await {
        Ok(Some(p)) => AppError::Conflict(format!("payment already {}", p.status)),
        _ => AppError::Conflict("payment is not pending".into()),
    }
}

#[instrument(skip(state), fields(user_id = %user_id, payment_id = %payment_id))]
pub async fn confirm_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<PaymentResponse>> {
    load_for_counterparty(&state, payment_id, user_id, true).await?;

    if !repo::confirm(&state.db, payment_id, user_id).await? {
        return Err(already_terminal(&state, payment_id).await);
    }

    let updated = repo::find_with_users(&state.db, payment_id).await?;
    info!("payment confirmed");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, payload), fields(user_id = %user_id, payment_id = %payment_id))]
pub async fn decline_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<DeclineRequest>,
) -> Result<Json<PaymentResponse>> {
    if let Some(note) = &payload.note {
        if note.chars().count() > MAX_DECLINE_NOTE {
            return Err(AppError::Validation(format!(
                "decline note must be at most {} characters",
                MAX_DECLINE_NOTE
            )));
        }
    }

    load_for_counterparty(&state, payment_id, user_id, true).await?;

    if !repo::decline(&state.db, payment_id, user_id, payload.note.as_deref()).await? {
        return Err(already_terminal(&state, payment_id).await);
    }

    let updated = repo::find_with_users(&state.db, payment_id).await?;
    info!("payment declined");
    Ok(Json(updated.into()))
}

#[instrument(skip(state), fields(user_id = %user_id, payment_id = %payment_id))]
pub async fn delete_payment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(payment_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    load_for_counterparty(&state, payment_id, user_id, false).await?;

    if !repo::delete_pending(&state.db, payment_id, user_id).await? {
        return Err(AppError::Conflict("payment is not pending".into()));
    }

    info!("pending payment deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn pending_payments(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PaymentResponse>>> {
    let rows = repo::pending_for_receiver(&state.db, user_id).await?;
    Ok(Json(rows.into_iter().map(PaymentResponse::from).collect()))
}
