//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The size model cannot account for this kind of value.
    ///
    /// This is a programming error in the caller: the value should be
    /// converted into a sized variant or wrapped in a `ByteLen` type.
    #[error("Unsupported value type: {0}")]
    UnsupportedType(String),

    /// Storing the value would overflow the store's byte accounting
    #[error("Accounted size overflows for key: {0}")]
    SizeOverflow(String),

    /// A configuration value could not be parsed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
