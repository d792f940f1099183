use std::collections::{HashMap, HashSet};

use axum::{
    extract::{Path, Query, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::error::{AppError, Result};
use crate::expenses::dto::{CreateExpenseRequest, ExpenseResponse, Pagination, SplitResponse};
use crate::expenses::engine::{self, ComputedExpense};
use crate::expenses::repo;
use crate::expenses::repo_types::Expense;
use crate::money::{decimal_to_cents, from_cents};
use crate::state::AppState;
use crate::trips;

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/trips/:id/expenses",
        post(create_expense).get(list_expenses),
    )
}

fn to_response(expense: Expense, splits: Vec<SplitResponse>) -> ExpenseResponse {
    ExpenseResponse {
        id: expense.id,
        trip_id: expense.trip_id,
        paid_by_id: expense.paid_by,
        title: expense.title,
        amount: from_cents(decimal_to_cents(expense.amount)),
        subtotal: from_cents(decimal_to_cents(expense.subtotal)),
        tax: from_cents(decimal_to_cents(expense.tax)),
        tip: from_cents(decimal_to_cents(expense.tip)),
        total: from_cents(decimal_to_cents(expense.total)),
        created_at: expense.created_at,
        splits,
    }
}

#[instrument(skip(state, payload), fields(user_id = %user_id, trip_id = %trip_id))]
pub async fn create_expense(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<CreateExpenseRequest>,
) -> Result<Json<ExpenseResponse>> {
    trips::repo::ensure_member(&state.db, trip_id, user_id).await?;

    let title = payload.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title must be non-empty".into()));
    }

    let member_ids: HashSet<Uuid> = trips::repo::members(&state.db, trip_id)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .collect();

    let computed: ComputedExpense = match (&payload.items, &payload.splits) {
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "payload cannot carry both items and splits".into(),
            ))
        }
        (Some(items), None) => {
            for item in items {
                for assignee in &item.assigned_user_ids {
                    if !member_ids.contains(assignee) {
                        return Err(AppError::Validation(format!(
                            "assigned user {} is not a trip member",
                            assignee
                        )));
                    }
                }
            }
            engine::compute_itemized(items, payload.tax.unwrap_or(0.0), payload.tip.as_ref())?
        }
        (None, Some(splits)) => {
            let amount = payload
                .amount
                .ok_or(AppError::Validation("amount is required".into()))?;
            for split in splits {
                if !member_ids.contains(&split.user_id) {
                    return Err(AppError::Validation(format!(
                        "split user {} is not a trip member",
                        split.user_id
                    )));
                }
            }
            engine::compute_simple(amount, splits)?
        }
        (None, None) => {
            return Err(AppError::Validation(
                "either items or splits is required".into(),
            ))
        }
    };

    let expense = repo::create(&state.db, trip_id, user_id, title, &computed).await?;

    let splits = computed
        .shares
        .iter()
        .map(|(uid, share)| SplitResponse {
            user_id: *uid,
            share: from_cents(*share),
        })
        .collect();

    info!(expense_id = %expense.id, total = %expense.total, "expense created");
    Ok(Json(to_response(expense, splits)))
}

#[instrument(skip(state), fields(user_id = %user_id, trip_id = %trip_id, limit = p.limit, offset = p.offset))]
pub async fn list_expenses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(trip_id): Path<Uuid>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<ExpenseResponse>>> {
    trips::repo::ensure_member(&state.db, trip_id, user_id).await?;

    let limit = p.limit.clamp(1, 200);
    let offset = p.offset.max(0);
    let expenses = repo::list_for_trip_paged(&state.db, trip_id, limit, offset).await?;
    let ids: Vec<Uuid> = expenses.iter().map(|e| e.id).collect();
    let splits = repo::splits_for_expenses(&state.db, &ids).await?;

    let mut by_expense: HashMap<Uuid, Vec<SplitResponse>> = HashMap::new();
    for split in splits {
        by_expense
            .entry(split.expense_id)
            .or_default()
            .push(SplitResponse {
                user_id: split.user_id,
                share: from_cents(decimal_to_cents(split.share)),
            });
    }

    Ok(Json(
        expenses
            .into_iter()
            .map(|e| {
                let splits = by_expense.remove(&e.id).unwrap_or_default();
                to_response(e, splits)
            })
            .collect(),
    ))
}

/// Expenses with their splits, shared with the trip detail endpoint.
pub async fn load_trip_expenses(
    state: &AppState,
    trip_id: Uuid,
) -> anyhow::Result<Vec<ExpenseResponse>> {
    let expenses = repo::list_for_trip(&state.db, trip_id).await?;
    let splits = repo::splits_for_trip(&state.db, trip_id).await?;

    let mut by_expense: HashMap<Uuid, Vec<SplitResponse>> = HashMap::new();
    for split in splits {
        by_expense
            .entry(split.expense_id)
            .or_default()
            .push(SplitResponse {
                user_id: split.user_id,
                share: from_cents(decimal_to_cents(split.share)),
            });
    }

    Ok(expenses
        .into_iter()
        .map(|e| {
            let splits = by_expense.remove(&e.id).unwrap_or_default();
            to_response(e, splits)
        })
        .collect())
}
