use thiserror::Error;

/// Reasons a manifest reference could not be turned into an absolute URL.
///
/// These never escape [`crate::rewrite`]: the offending line is kept as-is
/// and the error is only logged and counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The playlist's own URL is not a usable base for relative references
    #[error("Invalid source URL: {0}")]
    InvalidBase(String),

    /// The reference itself does not parse as (or resolve to) a URL
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// The reference resolved to something other than http or https
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ResolveError>;
