use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::User;
use crate::balance::{compute_balances, ExpenseEntry, PaymentEntry};
use crate::error::{AppError, Result};
use crate::expenses;
use crate::money::{decimal_to_cents, from_cents, is_settled, Cents};
use crate::payments;
use crate::payments::dto::PaymentResponse;
use crate::payments::repo_types::STATUS_CONFIRMED;
use crate::settlement::plan_settlements;
use crate::state::AppState;
use crate::trips::dto::{
    BalanceEntry, BalancesResponse, CreateTripRequest, InviteMemberRequest, SettlementEntry,
    TripDetail, TripInviteResponse, TripMemberResponse, TripSummary, UpdateTripRequest,
};
use crate::trips::repo;
use crate::trips::repo_types::{is_valid_status, TripMember};

pub fn trip_routes() -> Router<AppState> {
    Router::new()
        .route("/trips", get(list_trips).post(create_trip))
        .route("/trips/:id", get(get_trip).patch(update_trip))
        .route("/trips/:id/members", post(invite_member))
        .route("/trips/:id/balances", get(get_balances))
}

pub fn invite_routes() -> Router<AppState> {
    Router::new()
        .route("/invites", get(list_invites))
        .route("/invites/:id/accept", post(accept_invite))
        .route("/invites/:id/decline", post(decline_invite))
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().chars().count() < 2 {
        return Err(AppError::Validation(
            "trip name must be at least 2 characters".into(),
        ));
    }
    Ok(())
}

fn validate_status(status: &str) -> Result<()> {
    if !is_valid_status(status) {
        return Err(AppError::Validation(format!(
            "unknown trip status '{}'",
            status
        )));
    }
    Ok(())
}

#[instrument(skip(state, payload), fields(user_id = %user_id))]
pub async fn create_trip(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateTripRequest>,
) -> Result<Json<TripSummary>> {
    let name = payload.name.trim();
    validate_name(name)?;
    let status = payload.status.as_deref().unwrap_or("planning");
    validate_status(status)?;

    let trip = repo::create_with_owner(
        &state.db,
        name,
        payload.start_date,
        payload.end_date,
        status,
        user_id,
    )
    .await?;

    info!(trip_id = %trip.id, "trip created");
    Ok(Json(trip.into_summary(0.0, 0, 0.0)))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_trips(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TripSummary>>> {
    let trips = repo::list_for_user(&state.db, user_id).await?;

    let mut summaries = Vec::with_capacity(trips.len());
    for trip in trips {
        let (total, count) = repo::expense_aggregates(&state.db, trip.id).await?;
        let ledger = load_ledger(&state, trip.id).await?;
        let user_balance = ledger
            .balances
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, b)| *b)
            .unwrap_or(0);
        summaries.push(trip.into_summary(
            from_cents(decimal_to_cents(total)),
            count,
            from_cents(user_balance),
        ));
    }
    Ok(Json(summaries))
}

#[instrument(skip(state), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn get_trip(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<TripDetail>> {
    let trip = repo::ensure_member(&state.db, trip_id, user_id).await?;

    let ledger = load_ledger(&state, trip_id).await?;
    let expenses = expenses::handlers::load_trip_expenses(&state, trip_id).await?;
    let payments = payments::repo::list_for_trip(&state.db, trip_id)
        .await?
        .into_iter()
        .map(PaymentResponse::from)
        .collect();

    let user_balance = ledger.balance_of(user_id);
    let members: Vec<TripMemberResponse> = ledger
        .members
        .iter()
        .cloned()
        .map(TripMemberResponse::from)
        .collect();
    let (balances, settlements) = ledger.into_entries();

    Ok(Json(TripDetail {
        id: trip.id,
        name: trip.name,
        start_date: trip.start_date,
        end_date: trip.end_date,
        status: trip.status,
        created_at: trip.created_at,
        members,
        expenses,
        payments,
        balances,
        settlements,
        user_balance: from_cents(user_balance),
    }))
}

#[instrument(skip(state, payload), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn update_trip(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<UpdateTripRequest>,
) -> Result<Json<TripSummary>> {
    repo::ensure_member(&state.db, trip_id, user_id).await?;

    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(status) = &payload.status {
        validate_status(status)?;
    }

    let trip = repo::update(
        &state.db,
        trip_id,
        payload.name.as_deref().map(str::trim),
        payload.start_date,
        payload.end_date,
        payload.status.as_deref(),
    )
    .await?;

    let (total, count) = repo::expense_aggregates(&state.db, trip_id).await?;
    let ledger = load_ledger(&state, trip_id).await?;
    let user_balance = ledger.balance_of(user_id);

    info!("trip updated");
    Ok(Json(trip.into_summary(
        from_cents(decimal_to_cents(total)),
        count,
        from_cents(user_balance),
    )))
}

#[instrument(skip(state, payload), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn invite_member(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<InviteMemberRequest>,
) -> Result<Json<TripInviteResponse>> {
    repo::ensure_member(&state.db, trip_id, user_id).await?;

    let invitee = User::find_by_username(&state.db, payload.username.trim())
        .await?
        .ok_or(AppError::NotFound("user not found".into()))?;

    if repo::is_member(&state.db, trip_id, invitee.id).await? {
        return Err(AppError::Conflict("user is already a member".into()));
    }
    if repo::has_pending_invite(&state.db, trip_id, invitee.id).await? {
        return Err(AppError::Conflict("invite already pending".into()));
    }

    let invite = repo::create_invite(&state.db, trip_id, user_id, invitee.id).await?;
    info!(invite_id = %invite.id, invitee_id = %invitee.id, "trip invite created");
    Ok(Json(invite))
}

#[instrument(skip(state), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn get_balances(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<BalancesResponse>> {
    repo::ensure_member(&state.db, trip_id, user_id).await?;

    let ledger = load_ledger(&state, trip_id).await?;
    let user_balance = ledger.balance_of(user_id);
    let total_settled = ledger.total_settled;
    let payment_count = ledger.confirmed_payment_count;
    let (balances, settlements) = ledger.into_entries();

    Ok(Json(BalancesResponse {
        user_balance: from_cents(user_balance),
        balances,
        settlements,
        total_settled: from_cents(total_settled),
        payment_count,
    }))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_invites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<TripInviteResponse>>> {
    let invites = repo::pending_invites_for_user(&state.db, user_id).await?;
    Ok(Json(invites))
}

#[instrument(skip(state), fields(user_id = %user_id, invite_id = %invite_id))]
pub async fn accept_invite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let invite = repo::find_invite(&state.db, invite_id)
        .await?
        .ok_or(AppError::NotFound("invite not found".into()))?;
    if invite.invitee_id != user_id {
        return Err(AppError::Forbidden("not your invite".into()));
    }

    if !repo::accept_invite(&state.db, invite_id, user_id).await? {
        warn!("invite no longer pending");
        return Err(AppError::Conflict("invite is not pending".into()));
    }

    info!(trip_id = %invite.trip_id, "invite accepted");
    Ok(Json(serde_json::json!({ "tripId": invite.trip_id })))
}

#[instrument(skip(state), fields(user_id = %user_id, invite_id = %invite_id))]
pub async fn decline_invite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(invite_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    let invite = repo::find_invite(&state.db, invite_id)
        .await?
        .ok_or(AppError::NotFound("invite not found".into()))?;
    if invite.invitee_id != user_id {
        return Err(AppError::Forbidden("not your invite".into()));
    }

    if !repo::decline_invite(&state.db, invite_id, user_id).await? {
        return Err(AppError::Conflict("invite is not pending".into()));
    }

    info!("invite declined");
    Ok(Json(serde_json::json!({ "success": true })))
}

// ── Ledger assembly ──────────────────────────────────────────

/// The computed money view of one trip: balances in member join order plus
/// the planned settlement transfers.
pub struct TripLedger {
    pub members: Vec<TripMember>,
    pub balances: Vec<(Uuid, Cents)>,
    pub total_settled: Cents,
    pub confirmed_payment_count: i64,
}

impl TripLedger {
    pub fn balance_of(&self, user_id: Uuid) -> Cents {
        self.balances
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, b)| *b)
            .unwrap_or(0)
    }

    /// Response entries for the balances and settlements arrays.
    pub fn into_entries(self) -> (Vec<BalanceEntry>, Vec<SettlementEntry>) {
        let usernames: HashMap<Uuid, String> = self
            .members
            .iter()
            .map(|m| (m.user_id, m.username.clone()))
            .collect();
        let name = |id: &Uuid| usernames.get(id).cloned().unwrap_or_default();

        let settlements = plan_settlements(&self.balances)
            .into_iter()
            .map(|t| SettlementEntry {
                from_user_id: t.from,
                from_username: name(&t.from),
                to_user_id: t.to,
                to_username: name(&t.to),
                amount: from_cents(t.amount),
            })
            .collect();

        let balances = self
            .balances
            .iter()
            .map(|(id, b)| BalanceEntry {
                user_id: *id,
                username: name(id),
                balance: from_cents(*b),
                settled: is_settled(*b),
            })
            .collect();

        (balances, settlements)
    }
}

pub async fn load_ledger(state: &AppState, trip_id: Uuid) -> anyhow::Result<TripLedger> {
    let members = repo::members(&state.db, trip_id).await?;
    let member_ids: Vec<Uuid> = members.iter().map(|m| m.user_id).collect();

    let expense_rows = expenses::repo::list_for_trip(&state.db, trip_id).await?;
    let split_rows = expenses::repo::splits_for_trip(&state.db, trip_id).await?;
    let payment_rows = payments::repo::list_for_trip(&state.db, trip_id).await?;

    let mut splits_by_expense: HashMap<Uuid, Vec<(Uuid, Cents)>> = HashMap::new();
    for split in split_rows {
        splits_by_expense
            .entry(split.expense_id)
            .or_default()
            .push((split.user_id, decimal_to_cents(split.share)));
    }

    let expense_entries: Vec<ExpenseEntry> = expense_rows
        .iter()
        .map(|e| ExpenseEntry {
            paid_by: e.paid_by,
            total: decimal_to_cents(e.total),
            splits: splits_by_expense.remove(&e.id).unwrap_or_default(),
        })
        .collect();

    let mut total_settled: Cents = 0;
    let mut confirmed_payment_count: i64 = 0;
    let payment_entries: Vec<PaymentEntry> = payment_rows
        .iter()
        .map(|p| {
            let confirmed = p.status == STATUS_CONFIRMED;
            let amount = decimal_to_cents(p.amount);
            if confirmed {
                total_settled += amount;
                confirmed_payment_count += 1;
            }
            PaymentEntry {
                from_user: p.from_user_id,
                to_user: p.to_user_id,
                amount,
                confirmed,
            }
        })
        .collect();

    let computed = compute_balances(&member_ids, &expense_entries, &payment_entries);
    let balances: Vec<(Uuid, Cents)> = member_ids
        .iter()
        .map(|id| (*id, computed.get(id).copied().unwrap_or(0)))
        .collect();

    Ok(TripLedger {
        members,
        balances,
        total_settled,
        confirmed_payment_count,
    })
}
