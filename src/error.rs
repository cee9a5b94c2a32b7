//! Error types for the tiered cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for all cache operations.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in any configured tier
    #[error("cache: key is missing")]
    Miss,

    /// A write was attempted with no concrete value and no producer
    #[error("cache: value is missing")]
    MissingValue,

    /// Neither a remote tier nor a local tier is configured
    #[error("cache: both remote and local cache tiers are absent")]
    NoTiers,

    /// The remote tier collaborator failed
    #[error("cache: remote '{op}' error: {source}")]
    Remote {
        op: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The remote tier collaborator does not implement the named method.
    ///
    /// Deliberately not wrapped into [`CacheError::Remote`] so callers can
    /// tell a misconfigured collaborator apart from a transport failure.
    #[error("cache: remote tier does not implement '{0}'")]
    Unimplemented(&'static str),

    /// An encoded value carried a compression marker this codec does not know
    #[error("cache: unknown compression marker {0:#04x}")]
    UnknownCompression(u8),

    /// An encoded value carried a type tag this codec does not know
    #[error("cache: unknown type tag {0:#04x}")]
    UnknownTag(u8),

    /// A value could not be converted into its dynamic representation
    #[error("cache: value conversion error: {0}")]
    Conversion(#[from] serde_json::Error),

    /// MessagePack serialization failed
    #[error("cache: encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("cache: decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// A text-tagged payload was not valid UTF-8
    #[error("cache: text payload is not valid utf-8: {0}")]
    InvalidText(#[from] std::string::FromUtf8Error),

    /// Compression or decompression I/O failed
    #[error("cache: compression error: {0}")]
    Compression(#[from] std::io::Error),
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
