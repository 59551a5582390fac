//! HTTP handler for the Prometheus scrape endpoint.
//! Every request runs one fresh count against the bucket; a failed listing
//! becomes a 5xx response for that request only.

use crate::{errors::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};
use tracing::info;

/// Content type of the OpenMetrics text exposition.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// GET `/metrics` — count images added in the trailing hour and expose the gauge.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, AppError> {
    info!("Running scrape");
    let now = (state.clock)();
    let text = state.publisher.publish(now).await?;

    let mut response = Response::new(Body::from(text));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(OPENMETRICS_CONTENT_TYPE),
    );
    *response.status_mut() = StatusCode::OK;
    Ok(response)
}
