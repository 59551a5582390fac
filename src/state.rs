//! Shared router state.

use crate::services::metric_publisher::MetricPublisher;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Source of the scrape timestamp; `Utc::now` outside of tests.
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<MetricPublisher>,
    pub clock: Clock,
}

impl AppState {
    pub fn new(publisher: MetricPublisher) -> Self {
        Self {
            publisher: Arc::new(publisher),
            clock: Utc::now,
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}
