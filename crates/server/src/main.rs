mod bootstrap;
mod health;
mod invoke;

use std::time::Duration;

use anyhow::{Context, Result};
use readygate_core::config::{AppConfig, LoadOptions};
use tokio::net::TcpListener;

use crate::bootstrap::Application;

fn init_logging(config: &AppConfig) {
    use readygate_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config)?;
    serve(app).await
}

fn app_router(app: &Application) -> axum::Router {
    let health_state =
        health::HealthState::new(app.runtime.clone(), app.config.enabled_providers());
    let invoke_state = invoke::InvokeState::new(
        app.runtime.clone(),
        app.config.server.bearer_token.clone(),
        app.shutdown.clone(),
    );
    health::router(health_state).merge(invoke::router(invoke_state))
}

async fn serve(app: Application) -> Result<()> {
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener =
        TcpListener::bind(&address).await.with_context(|| format!("failed to bind {address}"))?;

    let router = app_router(&app);
    let stop = app.shutdown.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).with_graceful_shutdown(stop.cancelled_owned()).await
    });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        auth = if app.config.server.bearer_token.is_some() { "bearer" } else { "none" },
        "readygate-server started"
    );
    wait_for_shutdown().await?;
    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "readygate-server stopping"
    );

    app.shutdown.cancel();
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")??,
        Err(_) => tracing::warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "graceful shutdown window elapsed with connections still open"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
