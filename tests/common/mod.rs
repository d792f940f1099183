//! Shared helpers for router tests. The fake state carries a lazy pool that
//! never connects, so these tests exercise routing, extraction and
//! validation, not persistence.

use std::time::Duration;

use axum::Router;
use jsonwebtoken::{DecodingKey, EncodingKey};
use uuid::Uuid;

use tripledger::app::build_app;
use tripledger::auth::jwt::JwtKeys;
use tripledger::state::AppState;

pub fn create_test_app() -> Router {
    build_app(AppState::fake())
}

/// Token accepted by the fake state's JWT config.
pub fn create_test_jwt(user_id: Uuid) -> String {
    let keys = JwtKeys {
        encoding: EncodingKey::from_secret(b"test"),
        decoding: DecodingKey::from_secret(b"test"),
        issuer: "test".to_string(),
        audience: "test".to_string(),
        ttl: Duration::from_secs(300),
    };
    keys.sign(user_id).expect("sign test token")
}
