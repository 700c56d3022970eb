//! HTTP API server with observability for the order service.
//!
//! Read endpoints for order totals and customer order history, a local
//! ingest endpoint feeding the consumer pool, structured logging
//! (tracing), and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use domain::{
    CustomerStore, GetCustomerOrderCount, GetCustomerOrders, GetOrderTotal, OrderStore,
    ProcessOrder,
};
use ingest::{Consumer, DeadLetter};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub get_order_total: GetOrderTotal,
    pub get_customer_orders: GetCustomerOrders,
    pub get_customer_order_count: GetCustomerOrderCount,
    pub ingest_queue: mpsc::Sender<Vec<u8>>,
}

/// Everything `create_state` wires up besides the state itself.
pub struct IngestPipeline {
    /// Completes when the ingest queue closes and drains.
    pub consumer: JoinHandle<()>,
    /// Messages the pipeline could not process.
    pub dead_letters: mpsc::Receiver<DeadLetter>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders/{order_id}/total", get(routes::orders::total))
        .route("/customers/{customer_id}/orders", get(routes::customers::orders))
        .route(
            "/customers/{customer_id}/orders/count",
            get(routes::customers::order_count),
        )
        .route("/ingest", post(routes::ingest::submit))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the use cases and the consumer pool over the given stores.
///
/// Must run inside a Tokio runtime; the consumer workers are spawned here.
/// Dropping the state's `ingest_queue` sender shuts the pool down.
pub fn create_state(
    order_store: Arc<dyn OrderStore>,
    customer_store: Arc<dyn CustomerStore>,
    queue_capacity: usize,
    workers: usize,
) -> (Arc<AppState>, IngestPipeline) {
    let (ingest_tx, ingest_rx) = mpsc::channel(queue_capacity);
    let (dlq_tx, dlq_rx) = mpsc::channel(queue_capacity);

    let process = ProcessOrder::new(order_store.clone(), customer_store.clone());
    let consumer = Arc::new(Consumer::new(process, dlq_tx));
    let consumer_task = tokio::spawn(consumer.run(ingest_rx, workers));

    let state = Arc::new(AppState {
        get_order_total: GetOrderTotal::new(order_store.clone()),
        get_customer_orders: GetCustomerOrders::new(order_store, customer_store.clone()),
        get_customer_order_count: GetCustomerOrderCount::new(customer_store),
        ingest_queue: ingest_tx,
    });

    (
        state,
        IngestPipeline {
            consumer: consumer_task,
            dead_letters: dlq_rx,
        },
    )
}
