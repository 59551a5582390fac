//! Defines the exporter's HTTP routes.
//!
//! ## Structure
//! - `GET /`        — static landing page linking to the metrics route
//! - `GET /metrics` — Prometheus scrape endpoint (one fresh count per request)
//! - `GET /healthz` — liveness

use crate::{
    handlers::{health_handlers::healthz, index_handlers::index, metrics_handlers::metrics},
    state::AppState,
};
use axum::{Router, routing::get};

/// Build and return the router for the exporter.
///
/// The router carries shared state (`AppState`) to the metrics handler.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/metrics", get(metrics))
        .route("/healthz", get(healthz))
}
