//! Local caching module for offline data access.
//!
//! `CacheManager` stores the last fetched roster and custom field list as
//! JSON. Snapshots are considered stale after 60 minutes.

pub mod manager;

pub use manager::{CacheManager, CachedData};
