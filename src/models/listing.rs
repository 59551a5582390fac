//! One page of a paginated prefix listing.

use super::object::ObjectRecord;

/// Result of a single `ListObjectsV2`-style call.
///
/// `next_continuation_token` is `Some` only when the store reported more
/// results; passing it back to the lister yields the following page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<ObjectRecord>,
    pub next_continuation_token: Option<String>,
}
