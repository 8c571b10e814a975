use std::sync::Arc;

use anyhow::Context;

mod app;
mod appointments;
mod auth;
mod clock;
mod config;
mod db;
mod error;
mod files;
mod mail;
mod passwords;
mod state;
mod storage;
#[cfg(test)]
mod testutils;
mod users;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "appointments=debug,axum=info,tower_http=info".to_string());
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

    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::connect(&config.database_url).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("run database migrations")?;
    tracing::info!("database migrations applied");

    let app_state = AppState::init(config, pool).await?;
    app::serve(app::build_app(app_state)).await
}
