use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tripledger::app::{build_app, serve};
use tripledger::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tripledger=debug,axum=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::init().await?;
    let app = build_app(state);
    serve(app).await
}
