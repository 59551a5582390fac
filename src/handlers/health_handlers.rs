//! Liveness handler.
//!
//! - GET /healthz  -> `{"status":"ok"}`, no I/O
//!
//! Object store problems are reported by `/metrics`, not here.

use axum::Json;
use serde_json::{Value, json};

/// `GET /healthz`
pub async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
