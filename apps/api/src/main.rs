//! # Shopfront API server
//!
//! ## Startup
//! ```text
//! load config ─► connect primary (retry N × delay) ─► fallback DB?
//!      │
//!      ▼
//! migrations ─► bootstrap admin (empty users table only) ─► serve :http_port
//! ```
//!
//! Logging follows `RUST_LOG` (default `info`).

use anyhow::Context;
use shopfront_api::config::DEV_JWT_SECRET;
use shopfront_api::handlers::auth::bootstrap_admin;
use shopfront_api::{build_router, ApiConfig, AppState};
use shopfront_db::{ConnectionOrigin, Database};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Shopfront API server...");

    // Load configuration
    let config = ApiConfig::load().context("loading configuration")?;
    info!(
        port = config.http_port,
        database = %config.database_url,
        fallback = config.fallback_database_url.is_some(),
        "Configuration loaded"
    );
    if config.jwt_secret == DEV_JWT_SECRET {
        warn!("Using the development JWT secret; set SHOPFRONT_JWT_SECRET in production");
    }

    // Connect to database
    let db = Database::connect_with_fallback(
        config.primary_db(),
        config.fallback_db(),
        config.retry_policy(),
    )
    .await
    .context("connecting to database")?;
    if db.origin() == ConnectionOrigin::Fallback {
        warn!("Serving from the fallback database");
    }

    if let Some(password) = config.bootstrap_admin_password.as_deref() {
        if bootstrap_admin(&db, password)
            .await
            .context("creating bootstrap admin")?
        {
            info!("Log in as `admin` with the bootstrap password and change it");
        }
    }

    let addr = config.addr();
    let state = AppState::new(db.clone(), config)
        .await
        .context("opening session store")?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
