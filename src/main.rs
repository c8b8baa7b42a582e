//! KV Cache - A cache-aside key-value server
//!
//! An LRU cache in front of a durable backing store, with requests executed
//! on a fixed pool of worker threads.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kv_cache::api::create_router;
use kv_cache::config::{Config, StoreBackend};
use kv_cache::store::{BackingStore, FileStore, MemoryStore};
use kv_cache::AppState;

/// Main entry point for the KV Cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open and ping the backing store (failure is fatal)
/// 4. Build the LRU cache, worker pool and coordinator
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM stop accepting connections, then drain the pool
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kv_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting KV Cache Server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_capacity={}, worker_threads={}, port={}, store={:?}",
        config.cache_capacity, config.worker_threads, config.server_port, config.store_backend
    );

    let store = open_store(&config)?;
    store.ping().context("backing store is not reachable")?;
    info!("Backing store connection successful");

    let state = AppState::from_config(&config, store).context("failed to start worker pool")?;
    let pool = Arc::clone(&state.pool);

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    // Queued requests still run before the workers exit.
    tokio::task::spawn_blocking(move || pool.shutdown())
        .await
        .context("worker pool shutdown failed")?;

    info!("Server shutdown complete");
    Ok(())
}

fn open_store(config: &Config) -> anyhow::Result<Arc<dyn BackingStore>> {
    let store: Arc<dyn BackingStore> = match config.store_backend {
        StoreBackend::File => {
            let store = FileStore::open(&config.store_path).with_context(|| {
                format!("failed to open store at {}", config.store_path.display())
            })?;
            Arc::new(store)
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    Ok(store)
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
