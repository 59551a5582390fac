//! src/services/window_counter.rs
//!
//! WindowCounter — counts objects under the day-partitioned `raw/` prefix
//! whose last modification falls inside the trailing hour.
//!
//! The caller captures `now` once and derives both the listing prefix and
//! the window from it, so the two always agree on the date. Every page of the
//! listing is consumed before the count is returned.

use crate::services::object_lister::{ListerError, ListerResult, ObjectLister};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info};

/// Length of the trailing window.
pub const WINDOW_MINUTES: i64 = 60;

/// Build the listing prefix for a UTC calendar date: `raw/{year}/{month}/{day}`.
///
/// Month and day are plain integers (`raw/2024/3/7`, not `raw/2024/03/07`).
pub fn listing_prefix(date: NaiveDate) -> String {
    format!("raw/{}/{}/{}", date.year(), date.month(), date.day())
}

/// Open interval `(start, end)`: both boundaries are excluded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TrailingWindow {
    /// The window of `WINDOW_MINUTES` ending at `now`.
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        Self {
            start: now - Duration::minutes(WINDOW_MINUTES),
            end: now,
        }
    }

    pub fn contains(&self, check: DateTime<Utc>) -> bool {
        check > self.start && check < self.end
    }
}

#[derive(Clone)]
pub struct WindowCounter {
    lister: Arc<dyn ObjectLister>,
    bucket: String,

    /// Also list yesterday's prefix during the first UTC hour of the day, so
    /// objects written just before midnight are not missed.
    span_midnight: bool,
}

impl WindowCounter {
    pub fn new(lister: Arc<dyn ObjectLister>, bucket: impl Into<String>) -> Self {
        Self {
            lister,
            bucket: bucket.into(),
            span_midnight: true,
        }
    }

    pub fn with_span_midnight(mut self, span_midnight: bool) -> Self {
        self.span_midnight = span_midnight;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Count objects modified strictly inside `(now - 60min, now)`.
    pub async fn count_at(&self, now: DateTime<Utc>) -> ListerResult<usize> {
        let window = TrailingWindow::ending_at(now);

        let mut total = 0;
        for prefix in self.prefixes_for(now) {
            total += self.count_prefix(&prefix, &window).await?;
        }

        info!("imagesLastHour: {}", total);
        Ok(total)
    }

    /// Prefixes that can hold objects from the window ending at `now`.
    fn prefixes_for(&self, now: DateTime<Utc>) -> Vec<String> {
        let today = now.date_naive();
        let mut prefixes = vec![listing_prefix(today)];
        if self.span_midnight && now.hour() == 0 {
            if let Some(yesterday) = today.pred_opt() {
                prefixes.push(listing_prefix(yesterday));
            }
        }
        prefixes
    }

    /// Walk every page under `prefix` and count the objects inside `window`.
    async fn count_prefix(&self, prefix: &str, window: &TrailingWindow) -> ListerResult<usize> {
        debug!("Listing s3://{}/{}", self.bucket, prefix);

        let mut count = 0;
        let mut pages = 0;
        let mut token: Option<String> = None;
        let mut seen_tokens = HashSet::new();
        loop {
            let page = self
                .lister
                .list_page(&self.bucket, prefix, token.clone())
                .await?;
            pages += 1;

            count += page
                .objects
                .iter()
                .filter(|object| window.contains(object.last_modified))
                .count();

            let Some(next) = page.next_continuation_token else {
                break;
            };
            // a token handed out twice would restart a page walk already done
            if !seen_tokens.insert(next.clone()) {
                return Err(ListerError::Listing {
                    bucket: self.bucket.clone(),
                    prefix: prefix.to_string(),
                    reason: format!(
                        "pagination did not advance after page {}: token `{}` repeated",
                        pages, next
                    ),
                });
            }
            token = Some(next);
        }

        debug!(
            "{} objects in window under {} ({} pages)",
            count, prefix, pages
        );
        Ok(count)
    }
}
