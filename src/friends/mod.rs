use axum::Router;

use crate::state::AppState;

pub mod handlers;
pub mod repo;
pub mod repo_types;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
