use std::sync::Arc;

use parcel_tracker::api;
use parcel_tracker::config::{Config, LogFormat};
use parcel_tracker::error::AppError;
use parcel_tracker::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let mut app_state = AppState::new();
    if let Some(token) = &config.admin_token {
        app_state = app_state.with_admin_token(token);
        tracing::info!("bootstrap admin session enabled");
    }
    let shared_state = Arc::new(app_state);

    let app = if config.cors_allow_any {
        api::rest::router_with_cors(shared_state)
    } else {
        api::rest::router(shared_state)
    };

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
