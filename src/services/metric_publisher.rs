//! Exposes the window count as a single labelled gauge.
//!
//! A fresh `prometheus-client` registry is built for every scrape and dropped
//! right after encoding, so concurrent scrapes never share a value and several
//! publishers can live in one process.

use crate::services::{object_lister::ListerError, window_counter::WindowCounter};
use chrono::{DateTime, Utc};
use prometheus_client::{
    encoding::text::encode,
    metrics::{family::Family, gauge::Gauge},
    registry::Registry,
};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Count(#[from] ListerError),
    #[error("failed to encode metrics: {0}")]
    Encoding(#[from] std::fmt::Error),
}

type EnvironmentGauge = Family<Vec<(String, String)>, Gauge>;

/// The one metric an exporter can emit: its name, help text and label name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetricSchema {
    pub name: &'static str,
    pub help: &'static str,
    pub label: &'static str,
}

impl MetricSchema {
    pub const fn article_images() -> Self {
        Self {
            name: "article_images_last_hour",
            help: "Images added in the last hour",
            label: "environment",
        }
    }

    /// Encode the metric header without running a scrape: an empty family
    /// has no samples, so only `# HELP` / `# TYPE` are written.
    pub fn describe(&self) -> Result<String, std::fmt::Error> {
        self.encode(EnvironmentGauge::default())
    }

    /// The label set a sample for `environment` is published under.
    fn labels(&self, environment: &str) -> Vec<(String, String)> {
        vec![(self.label.to_string(), environment.to_string())]
    }

    /// Register `gauge` in a throwaway registry and render it as text.
    fn encode(&self, gauge: EnvironmentGauge) -> Result<String, std::fmt::Error> {
        let mut registry = Registry::default();
        registry.register(self.name, self.help, gauge);

        let mut buffer = String::new();
        encode(&mut buffer, &registry)?;
        Ok(buffer)
    }
}

pub struct MetricPublisher {
    schema: MetricSchema,
    counter: WindowCounter,
    environment: String,
}

impl MetricPublisher {
    pub fn new(schema: MetricSchema, counter: WindowCounter, environment: impl Into<String>) -> Self {
        Self {
            schema,
            counter,
            environment: environment.into(),
        }
    }

    pub fn schema(&self) -> &MetricSchema {
        &self.schema
    }

    /// Run the counter once for `now` and encode the resulting gauge sample.
    pub async fn publish(&self, now: DateTime<Utc>) -> Result<String, PublishError> {
        let count = self.counter.count_at(now).await.inspect_err(|err| {
            error!(
                "scrape of bucket `{}` failed: {}",
                self.counter.bucket(),
                err
            );
        })?;

        let gauge = EnvironmentGauge::default();
        gauge
            .get_or_create(&self.schema.labels(&self.environment))
            .set(i64::try_from(count).unwrap_or(i64::MAX));

        Ok(self.schema.encode(gauge)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::object::ObjectRecord;
    use crate::services::object_lister::testing::{FailingLister, PagedLister};
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 14, 30, 0).unwrap()
    }

    fn publisher(objects: Vec<ObjectRecord>, environment: &str) -> MetricPublisher {
        let lister = Arc::new(PagedLister::new(objects, 2));
        MetricPublisher::new(
            MetricSchema::article_images(),
            WindowCounter::new(lister, "article-images"),
            environment,
        )
    }

    #[test]
    fn schema_is_described_without_scraping() {
        let described = MetricSchema::article_images().describe().unwrap();
        assert!(described.starts_with(
            "# HELP article_images_last_hour Images added in the last hour.\n\
             # TYPE article_images_last_hour gauge\n"
        ));
        assert!(!described.contains("article_images_last_hour{"));
    }

    #[tokio::test]
    async fn scrape_output_starts_with_the_described_header() {
        let publisher = publisher(Vec::new(), "production");
        let header = publisher.schema().describe().unwrap();
        let text = publisher.publish(now()).await.unwrap();

        let header = header.trim_end_matches("# EOF\n");
        assert!(text.starts_with(header));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_publishers_keep_their_own_values() {
        let busy = publisher(
            (0..40)
                .map(|i| {
                    ObjectRecord::new(
                        format!("raw/2024/6/15/{i}.jpg"),
                        now() - Duration::seconds(i + 1),
                    )
                })
                .collect(),
            "production",
        );
        let quiet = publisher(
            vec![ObjectRecord::new(
                "raw/2024/6/15/a.jpg",
                now() - Duration::minutes(5),
            )],
            "staging",
        );

        let (a, b, c) = tokio::join!(busy.publish(now()), quiet.publish(now()), busy.publish(now()));
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());

        assert!(a.contains("article_images_last_hour{environment=\"production\"} 40"));
        assert!(b.contains("article_images_last_hour{environment=\"staging\"} 1"));
        assert!(!b.contains("production"));
        assert_eq!(a, c);
    }

    #[tokio::test]
    async fn publishes_one_labelled_gauge_sample() {
        let objects = vec![
            ObjectRecord::new("raw/2024/6/15/a.jpg", now() - Duration::minutes(1)),
            ObjectRecord::new("raw/2024/6/15/b.jpg", now() - Duration::minutes(30)),
            ObjectRecord::new("raw/2024/6/15/c.jpg", now() - Duration::minutes(61)),
        ];
        let text = publisher(objects, "production").publish(now()).await.unwrap();

        assert!(text.contains("# TYPE article_images_last_hour gauge"));
        assert!(text.contains("Images added in the last hour"));
        assert!(text.contains("article_images_last_hour{environment=\"production\"} 2"));
        assert_eq!(text.matches("article_images_last_hour{").count(), 1);
    }

    #[tokio::test]
    async fn each_scrape_replaces_the_previous_value() {
        let first = publisher(
            vec![ObjectRecord::new(
                "raw/2024/6/15/a.jpg",
                now() - Duration::minutes(1),
            )],
            "staging",
        );
        let second = publisher(Vec::new(), "staging");

        let a = first.publish(now()).await.unwrap();
        let b = second.publish(now()).await.unwrap();
        let again = first.publish(now()).await.unwrap();

        assert!(a.contains("article_images_last_hour{environment=\"staging\"} 1"));
        assert!(b.contains("article_images_last_hour{environment=\"staging\"} 0"));
        assert_eq!(a, again);
    }

    #[tokio::test]
    async fn listing_failure_fails_the_scrape() {
        let publisher = MetricPublisher::new(
            MetricSchema::article_images(),
            WindowCounter::new(Arc::new(FailingLister), "article-images"),
            "production",
        );
        let err = publisher.publish(now()).await.unwrap_err();
        assert!(matches!(err, PublishError::Count(ListerError::Listing { .. })));
    }
}
