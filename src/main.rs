use anyhow::{Context, Result};
use axum::Router;
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;
mod state;

use services::{
    metric_publisher::{MetricPublisher, MetricSchema},
    object_lister::S3ObjectLister,
    window_counter::WindowCounter,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse + validate config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    for name in cfg.check()? {
        tracing::warn!("No {} set", name);
    }

    tracing::info!("Bucket Name: {}", cfg.bucket_name);
    tracing::info!("Environment: {}", cfg.environment);
    tracing::info!("AWS Region: {}", cfg.region);
    tracing::debug!("Starting s3-image-exporter with config: {:?}", cfg);

    // --- Initialize exporter ---
    let lister = Arc::new(S3ObjectLister::new(
        cfg.region.clone(),
        cfg.endpoint_url.clone(),
    ));
    let counter = WindowCounter::new(lister, cfg.bucket_name.clone())
        .with_span_midnight(cfg.span_midnight);
    let publisher =
        MetricPublisher::new(MetricSchema::article_images(), counter, cfg.environment.clone());
    let schema = publisher.schema();
    tracing::debug!(
        "Exposing metric with label `{}`:\n{}",
        schema.label,
        schema.describe()?
    );

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state::AppState::new(publisher));

    // --- Start server ---
    let listener = bind(&cfg).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Bind the configured address. A refused wildcard bind is retried on loopback
/// so the exporter still comes up inside unprivileged sandboxes.
async fn bind(cfg: &config::AppConfig) -> Result<TcpListener> {
    let addr = cfg.addr();
    match TcpListener::bind(&addr).await {
        Err(err) if err.kind() == ErrorKind::PermissionDenied && cfg.binds_all_interfaces() => {
            let loopback = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!("Binding {} refused ({}), using {}", addr, err, loopback);
            TcpListener::bind(&loopback)
                .await
                .with_context(|| format!("binding {}", loopback))
        }
        bound => bound.with_context(|| format!("binding {}", addr)),
    }
}
