//! src/services/object_lister.rs
//!
//! The object store capability the exporter consumes: a prefix-scoped,
//! paginated listing. `ObjectLister` hands out one page per call together
//! with its continuation token, so callers own the page walk and can prove it
//! was drained. `S3ObjectLister` is the production implementation on top of
//! the AWS SDK (`ListObjectsV2`).

use crate::models::{listing::ListPage, object::ObjectRecord};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Builder as S3ConfigBuilder, Region},
    error::DisplayErrorContext,
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ListerError {
    #[error("unable to start object store session: {0}")]
    SessionInit(String),
    #[error("failed to list objects in bucket `{bucket}` under `{prefix}`: {reason}")]
    Listing {
        bucket: String,
        prefix: String,
        reason: String,
    },
}

pub type ListerResult<T> = Result<T, ListerError>;

/// Paginated "list objects under prefix" capability.
///
/// Passing `None` as `continuation_token` requests the first page. Each
/// returned page carries the token for the next one, or `None` when the
/// listing is complete.
#[async_trait]
pub trait ObjectLister: Send + Sync {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> ListerResult<ListPage>;
}

/// S3 (or S3-compatible) listing backed by `aws-sdk-s3`.
///
/// The SDK session is created on first use and reused afterwards. A failed
/// session setup is reported to the caller and attempted again on the next
/// call instead of taking the process down.
pub struct S3ObjectLister {
    region: String,
    endpoint_url: Option<String>,
    client: OnceCell<Client>,
}

impl S3ObjectLister {
    pub fn new(region: impl Into<String>, endpoint_url: Option<String>) -> Self {
        Self {
            region: region.into(),
            endpoint_url,
            client: OnceCell::new(),
        }
    }

    /// Load the SDK configuration (credentials chain, region) and build a client.
    async fn connect(&self) -> ListerResult<Client> {
        if self.region.trim().is_empty() {
            return Err(ListerError::SessionInit("no AWS region configured".into()));
        }

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await;

        if sdk_config.credentials_provider().is_none() {
            return Err(ListerError::SessionInit(
                "no credentials provider available".into(),
            ));
        }

        let mut builder = S3ConfigBuilder::from(&sdk_config);
        if let Some(url) = &self.endpoint_url {
            // path-style: bucket in the URL path, not the host name
            builder = builder.endpoint_url(url).force_path_style(true);
        }

        info!(
            "S3 session established (region: {}, endpoint: {})",
            self.region,
            self.endpoint_url.as_deref().unwrap_or("default")
        );
        Ok(Client::from_conf(builder.build()))
    }

    async fn client(&self) -> ListerResult<&Client> {
        self.client.get_or_try_init(|| self.connect()).await
    }
}

#[async_trait]
impl ObjectLister for S3ObjectLister {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> ListerResult<ListPage> {
        let client = self.client().await?;

        let output = client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|err| ListerError::Listing {
                bucket: bucket.to_string(),
                prefix: prefix.to_string(),
                reason: DisplayErrorContext(&err).to_string(),
            })?;

        let mut objects = Vec::with_capacity(output.contents().len());
        for object in output.contents() {
            let key = object.key().unwrap_or_default();
            let Some(last_modified) = object.last_modified().and_then(|ts| {
                DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos())
            }) else {
                debug!("skipping `{}`: no usable LastModified", key);
                continue;
            };
            objects.push(ObjectRecord::new(key, last_modified));
        }

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            objects,
            next_continuation_token,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::testing::PagedLister;
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn s3_lister_without_region_fails_session_setup() {
        let lister = S3ObjectLister::new("", None);
        let err = lister
            .list_page("images", "raw/2024/3/7", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ListerError::SessionInit(_)));
    }

    #[tokio::test]
    async fn paged_lister_walks_pages_with_tokens() {
        let objects = (0..5)
            .map(|i| ObjectRecord::new(format!("raw/2024/3/7/{i}.jpg"), at(i)))
            .collect();
        let lister = PagedLister::new(objects, 2);

        let first = lister.list_page("b", "raw/", None).await.unwrap();
        assert_eq!(first.objects.len(), 2);
        assert!(first.next_continuation_token.is_some());

        let second = lister
            .list_page("b", "raw/", first.next_continuation_token)
            .await
            .unwrap();
        let third = lister
            .list_page("b", "raw/", second.next_continuation_token)
            .await
            .unwrap();
        assert_eq!(third.objects.len(), 1);
        assert_eq!(third.next_continuation_token, None);
        assert_eq!(lister.calls(), 3);
    }
}
