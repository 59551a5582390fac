//! Represents an object (file) returned by a bucket listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single object seen while listing a bucket prefix.
///
/// Only the attributes needed to place the object in time are kept; the
/// object itself stays owned by the store and is never read or mutated.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ObjectRecord {
    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Timestamp when object was last modified.
    pub last_modified: DateTime<Utc>,
}

impl ObjectRecord {
    pub fn new(key: impl Into<String>, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}
