//! Carebook API Server
//!
//! REST API server for user accounts and appointment scheduling.

use anyhow::Context;
use carebook_api::{create_router, state::AppState};
use carebook_core::config::{AppConfig, LoggingConfig, DEVELOPMENT_JWT_SECRET};
use sqlx::postgres::PgPoolOptions;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; CONFIG_FILE points at an optional TOML file
    let config_file = std::env::var_os("CONFIG_FILE").map(PathBuf::from);
    let config = AppConfig::load(config_file.as_deref())?;

    init_tracing(&config.logging);

    if config.auth.jwt_secret == DEVELOPMENT_JWT_SECRET {
        warn!("JWT_SECRET is not set; tokens are signed with the development secret");
    }

    // Create application state
    let state = if config.database.is_configured() {
        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        if config.database.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database migrations applied");
        }

        AppState::with_postgres(pool, config.clone())
    } else {
        warn!("DATABASE_URL not set; using in-memory storage");
        AppState::in_memory(config.clone())
    };

    let app = create_router(Arc::new(state));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Carebook API Server starting on http://{}", addr);
    info!("Swagger UI available at http://{}/swagger-ui/", addr);
    info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "carebook_api={level},carebook_core={level},tower_http={level},audit=info",
            level = logging.level
        ))
    });

    if logging.json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires; never resolves if the listener failed
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_signal_triggers_shutdown() {
        let result = timeout(Duration::from_millis(100), wait_for_signal(async { Ok(()) })).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_failed_listener_keeps_serving() {
        let failing = async { Err(std::io::Error::other("no signal handler")) };

        let result = timeout(Duration::from_millis(100), wait_for_signal(failing)).await;
        assert!(result.is_err());
    }
}
