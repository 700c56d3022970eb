//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use domain::{CustomerStore, OrderStore};
use store::{InMemoryStore, PostgresStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    let config = Config::from_env();

    // 3. Select the store: PostgreSQL when configured, in-memory otherwise
    let (order_store, customer_store): (Arc<dyn OrderStore>, Arc<dyn CustomerStore>) =
        match &config.database_url {
            Some(url) => {
                let store = PostgresStore::connect(url)
                    .await
                    .expect("failed to connect to database");
                store
                    .run_migrations()
                    .await
                    .expect("failed to run migrations");
                tracing::info!("using PostgreSQL store");
                (Arc::new(store.clone()), Arc::new(store))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                let store = InMemoryStore::new();
                (Arc::new(store.clone()), Arc::new(store))
            }
        };

    // 4. Wire use cases and the ingest consumer pool
    let (state, pipeline) = api::create_state(
        order_store,
        customer_store,
        config.ingest_queue_capacity,
        config.ingest_workers,
    );
    let api::IngestPipeline {
        consumer,
        mut dead_letters,
    } = pipeline;

    // 5. Drain the dead-letter seam into the log
    let dlq_task = tokio::spawn(async move {
        while let Some(letter) = dead_letters.recv().await {
            tracing::error!(
                reason = %letter.reason,
                bytes = letter.payload.len(),
                "dead-lettered message"
            );
        }
    });

    // 6. Build and start the server
    let app = api::create_app(state.clone(), metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, workers = config.ingest_workers, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Close the ingest queue and let the workers drain
    drop(state);
    let _ = consumer.await;
    dlq_task.abort();

    tracing::info!("server shut down gracefully");
}
