//! Data model for the object store listing.
//!
//! These types are what the exporter sees of a bucket: a page of object
//! records plus the token needed to fetch the next page.

pub mod listing;
pub mod object;
