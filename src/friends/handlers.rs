use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::auth::jwt::AuthUser;
use crate::auth::repo_types::User;
use crate::error::{AppError, Result};
use crate::friends::repo;
use crate::friends::repo_types::{Friend, FriendInvite};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/friends", get(list_friends).post(send_invite))
        .route("/friends/:id", delete(remove_friend))
        .route("/friends/invites", get(list_invites))
        .route("/friends/invites/:id/accept", post(accept_invite))
        .route("/friends/invites/:id/decline", post(decline_invite))
}

#[derive(Debug, Deserialize)]
pub struct SendInviteRequest {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct FriendInvitesResponse {
    pub incoming: Vec<FriendInvite>,
    pub outgoing: Vec<FriendInvite>,
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_friends(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Friend>>> {
    let friends = repo::list_for_user(&state.db, user_id).await?;
    Ok(Json(friends))
}

#[instrument(skip(state, payload), fields(user_id = %user_id))]
pub async fn send_invite(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SendInviteRequest>,
) -> Result<Json<FriendInvite>> {
    let receiver = User::find_by_username(&state.db, payload.username.trim())
        .await?
        .ok_or(AppError::NotFound("user not found".into()))?;

    if receiver.id == user_id {
        return Err(AppError::Validation("cannot befriend yourself".into()));
    }
    if repo::are_friends(&state.db, user_id, receiver.id).await? {
        return Err(AppError::Conflict("already friends".into()));
    }
    if repo::has_pending_invite(&state.db, user_id, receiver.id).await? {
        return Err(AppError::Conflict("invite already pending".into()));
    }

    let invite = repo::create_invite(&state.db, user_id, receiver.id).await?;
    info!(invite_id = %invite.id, receiver_id = %receiver.id, "friend invite sent");
    Ok(Json(invite))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_invites(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<FriendInvitesResponse>> {
    let all = repo::pending_invites(&state.db, user_id).await?;
    let (incoming, outgoing): (Vec<FriendInvite>, Vec<FriendInvite>) =
        all.into_iter().partition(|i| i.receiver_id == user_id);
    Ok(Json(FriendInvitesResponse { incoming, outgoing }))
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
    if invite.receiver_id != user_id {
        return Err(AppError::Forbidden("not your invite".into()));
    }

    if !repo::accept_invite(&state.db, invite_id, user_id).await? {
        return Err(AppError::Conflict("invite is not pending".into()));
    }

    info!(friend_id = %invite.sender_id, "friend invite accepted");
    Ok(Json(serde_json::json!({ "success": true })))
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
    if invite.receiver_id != user_id {
        return Err(AppError::Forbidden("not your invite".into()));
    }

    if !repo::decline_invite(&state.db, invite_id, user_id).await? {
        return Err(AppError::Conflict("invite is not pending".into()));
    }

    info!("friend invite declined");
    Ok(Json(serde_json::json!({ "success": true })))
}

#[instrument(skip(state), fields(user_id = %user_id, friend_id = %friend_id))]
pub async fn remove_friend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(friend_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>> {
    if !repo::remove(&state.db, user_id, friend_id).await? {
        return Err(AppError::NotFound("friendship not found".into()));
    }
    info!("friend removed");
    Ok(Json(serde_json::json!({ "success": true })))
}
