use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_api::api::handlers::AppStateInner;
use user_api::api::routes::create_router;
use user_api::config::{Config, LogFormat};
use user_api::db::{self, InstrumentedDatabase};
use user_api::errors::ExceptionFilter;
use user_api::metrics;
use user_api::users::UserService;

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Starting graceful shutdown...");
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,user_api=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: it decides the log format
    let config = Config::from_env().context("Failed to load configuration")?;
    init_logging(config.app.log_format);

    info!(
        environment = ?config.app.environment,
        verbose_errors = config.app.verbose_errors,
        "Starting User API v{}",
        env!("CARGO_PKG_VERSION")
    );

    metrics::registry::init_metrics();
    info!("Metrics registry initialized");

    info!("Connecting to database...");
    let db = db::init_database(&config.database)
        .await
        .context("Failed to initialize database")?;

    db.test_connection()
        .await
        .context("Failed to test database connection")?;
    info!("Database connection established");

    let db: db::Database = Arc::new(InstrumentedDatabase::new(db));
    let users = UserService::new(db, config.auth.clone());

    let state = Arc::new(AppStateInner {
        users,
        environment: config.app.environment,
        instance_id: config.server.instance_id.clone(),
    });
    let filter = ExceptionFilter::new(config.app.verbose_errors);

    let app = create_router(state, filter);

    let addr = config.server_address();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server")?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
