//! Error types for keycache

use thiserror::Error;

/// Result type alias for keycache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised when building a cache
///
/// Cache operations themselves never fail.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A cache must be able to hold at least one key
    #[error("cache capacity must be greater than 0")]
    ZeroCapacity,
}
