//! Reactive cache module
//!
//! Cache keys, the per-surface key tracker, the normalized store and the
//! live-watch plumbing that ties them together.

mod key;
mod store;
mod tracker;
mod watch;

pub use key::{AccountCacheKey, StatusCacheKey, TimelineCacheKey};
pub use store::NormalizedStore;
pub use tracker::CacheKeyTracker;
pub use watch::switch_to_latest;
