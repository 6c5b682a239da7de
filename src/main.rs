mod app;
mod auth;
mod config;
mod error;
mod extract;
mod state;
mod store;
mod tasks;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| config.mode.default_log_filter().to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    if config.jwt.secret.is_none() {
        tracing::warn!("JWT_SECRET is not set; login and authenticated routes will fail");
    }
    tracing::info!(mode = ?config.mode, "starting taskmind");

    let app_state = AppState::init(config).await?;
    tracing::info!("database connected and migrated");

    let (host, port) = (app_state.config.host.clone(), app_state.config.port);
    app::serve(app::build_app(app_state), &host, port).await
}
