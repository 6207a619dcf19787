use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use trip_dispatch::api;
use trip_dispatch::config::Config;
use trip_dispatch::engine::reminder::{reminder_for, schedule_reminder};
use trip_dispatch::error::AppError;
use trip_dispatch::state::AppState;
use trip_dispatch::storage::{JsonFileStore, KeyValueStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let store: Arc<dyn KeyValueStore> = if config.store_in_memory {
        tracing::info!("using in-memory store");
        Arc::new(MemoryStore::new())
    } else {
        let store = JsonFileStore::open(&config.store_path)?;
        tracing::info!(path = %store.path().display(), "using file store");
        Arc::new(store)
    };

    let app_state = AppState::new(
        store,
        config.event_buffer_size,
        config.reminder_lead_minutes,
    )?;
    let shared_state = Arc::new(app_state);

    if config.seed_demo_data {
        shared_state.seed_if_empty().await?;
    }

    let pending_reminders: Vec<_> = shared_state
        .fleet
        .read()
        .await
        .trips()
        .iter()
        .filter_map(|trip| reminder_for(trip, shared_state.reminder_lead))
        .collect();
    for reminder in pending_reminders {
        schedule_reminder(shared_state.clone(), reminder);
    }

    let app = api::rest::router(shared_state.clone());

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
