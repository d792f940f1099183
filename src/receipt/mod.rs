use axum::Router;

use crate::state::AppState;

pub mod handlers;
pub mod normalize;
pub mod parser;
pub mod verifier;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
