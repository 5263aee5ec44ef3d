//! Serve command - HTTP triggers plus the in-process scheduler

use anyhow::{Context, Result};
use autopost_adapters::http::{self, AppState, AuthConfig};
use std::path::PathBuf;
use tokio::net::TcpListener;

use super::{build_controller, load_secret_digest, open_database};
use crate::args::ServeArgs;
use crate::config::AppConfig;

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let db = open_database(&config).await?;
    let controller = build_controller(&config, &db)?;

    if config.automation.resume_on_startup {
        match controller
            .resume()
            .await
            .context("Failed to resume automation")?
        {
            Some(interval) => {
                tracing::info!(interval_minutes = interval.get(), "Resumed scheduled generation")
            }
            None => tracing::info!("Automation is stopped, waiting for a start action"),
        }
    }

    let auth = AuthConfig {
        admin_token: load_secret_digest(&config.server.admin_token_env),
        webhook_key: load_secret_digest(&config.server.webhook_key_env),
    };
    if auth.admin_token.is_none() {
        tracing::warn!(
            env = %config.server.admin_token_env,
            "Admin token not set, /api/automation will reject every request"
        );
    }
    if auth.webhook_key.is_none() {
        tracing::warn!(
            env = %config.server.webhook_key_env,
            "Webhook key not set, /api/cron/generate will reject every request"
        );
    }

    let bind = args.bind.unwrap_or(config.server.bind);
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    tracing::info!(
        addr = %listener.local_addr().context("Failed to read local address")?,
        provider = %config.llm.provider,
        db_path = %config.general.db_path.display(),
        "Starting autopost server"
    );

    let app = http::router(AppState::new(controller.clone(), auth));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Persisted status stays as-is so the next boot can resume.
    controller.shutdown();
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
