use lab_service::{
    build_router,
    config::{LabConfig, StorageBackend},
    db,
    services::{Database, LogNotifier, MemoryStore, ResetNotifier},
    AppState,
};
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Fail fast on invalid configuration
    let config = LabConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        storage = ?config.storage,
        "Starting lab service"
    );

    let notifier: Arc<dyn ResetNotifier> =
        Arc::new(LogNotifier::new(config.password_reset.log_tokens));

    let state = match (config.storage, config.database.as_ref()) {
        (StorageBackend::Postgres, Some(db_config)) => {
            let pool = db::create_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            AppState::with_store(config.clone(), Arc::new(Database::new(pool)), notifier)
        }
        (StorageBackend::Postgres, None) => {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_URL is required for the postgres storage backend"
            )));
        }
        (StorageBackend::Memory, _) => {
            tracing::warn!("Using in-memory storage; data does not survive restarts");
            AppState::with_store(config.clone(), Arc::new(MemoryStore::new()), notifier)
        }
    };

    let app = build_router(state);

    let addr = config.common.socket_addr();
    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
