//! # keycache
//!
//! Bounded existence cache for "have I seen this before?" checks.
//!
//! ## Architecture
//! - **Fingerprints**: inputs are hashed to `u64` with a per-instance AHash seed
//! - **Store**: AHash map from fingerprint to last-touch clock, behind one lock
//! - **Eviction**: linear scan for the oldest clock when over capacity
//!
//! ```
//! use keycache::LruKeyCache;
//!
//! let cache = LruKeyCache::new(128);
//! let key = cache.make_key("query { user(id: 1) { name } }");
//!
//! if let (_, false) = cache.lookup(key) {
//!     // expensive work here
//!     cache.insert(key);
//! }
//! assert_eq!(cache.lookup(key), (1, true));
//! ```

#![warn(missing_docs)]

mod error;
mod key_cache;
mod stats;
pub mod trace;

pub use error::{Error, Result};
pub use key_cache::LruKeyCache;
pub use stats::{CacheStats, StatsSnapshot};
pub use trace::{LogTracer, LookupStats, LookupTracer, NoopTracer};
