//! API server: HTTP (REST) endpoints plus an optional Prometheus exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use upi_core::config::AppConfig;
use upi_engine::{BatchCoordinator, RecommendationEngine, UserInsightService};

pub struct ApiServer {
    config: AppConfig,
    engine: Arc<RecommendationEngine>,
}

impl ApiServer {
    pub fn new(config: AppConfig, engine: Arc<RecommendationEngine>) -> Self {
        Self { config, engine }
    }

    fn state(&self) -> AppState {
        AppState {
            engine: self.engine.clone(),
            insights: Arc::new(UserInsightService::new(self.engine.shared_config())),
            batch: Arc::new(BatchCoordinator::new(
                self.engine.clone(),
                self.config.engine.batch_workers,
            )),
            node_id: self.config.node_id.clone(),
            start_time: Instant::now(),
            batch_max_size: self.config.engine.batch_max_size,
        }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let app = router(self.state());

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port. Must be called from
    /// within the tokio runtime; the listener runs as a background task.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

/// Build the REST router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(rest::index))
        // Recommendation endpoints
        .route("/recommend", post(rest::handle_recommend))
        .route("/user-insights/:user_id", get(rest::handle_user_insights))
        .route("/v1/recommend/batch", post(rest::handle_batch))
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
