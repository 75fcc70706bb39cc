//! Axum-based REST server.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::routing::{delete, get, post};
use axum::Router;
use prometheus::Registry;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use venue_codes::VenueCodeService;

use crate::error::RpcError;
use crate::handlers;

/// Counters the server bumps as requests are served.
///
/// Implemented by the node's metrics so this crate stays independent of it.
pub trait RpcMetrics: Send + Sync {
    fn code_issued(&self);
    fn active_codes(&self, count: usize);
    fn sweep_completed(&self, deleted: usize);
    fn verification(&self, outcome: &str);
}

/// Shared state handed to every handler.
pub struct RpcState {
    pub started_at: Instant,
    pub service: Arc<VenueCodeService>,
    pub metrics: Option<Arc<dyn RpcMetrics>>,
    /// Registry encoded at `/metrics`; `None` disables the endpoint.
    pub metrics_registry: Option<Registry>,
}

impl RpcState {
    pub fn new(service: Arc<VenueCodeService>) -> Self {
        Self {
            started_at: Instant::now(),
            service,
            metrics: None,
            metrics_registry: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn RpcMetrics>, registry: Registry) -> Self {
        self.metrics = Some(metrics);
        self.metrics_registry = Some(registry);
        self
    }
}

/// Build the router with every endpoint.
pub fn router(state: Arc<RpcState>) -> Router {
    Router::new()
        .route(
            "/api/v1/venue-codes",
            post(handlers::create_code).get(handlers::list_codes),
        )
        .route("/api/v1/venue-codes/sweep", post(handlers::sweep))
        .route("/api/v1/venue-codes/:id", delete(handlers::delete_code))
        .route("/api/v1/venues/verify", post(handlers::verify))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct RpcServer {
    pub host: String,
    pub port: u16,
    pub state: Arc<RpcState>,
}

impl RpcServer {
    pub fn with_state(host: impl Into<String>, port: u16, state: Arc<RpcState>) -> Self {
        Self {
            host: host.into(),
            port,
            state,
        }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn start<F>(&self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state.clone());
        let addr = format!("{}:{}", self.host, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!(%addr, "REST server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("REST server stopped");
        Ok(())
    }
}
