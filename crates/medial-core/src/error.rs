//! Error types for the MEDIAL embed adapter

use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Adapter error types
#[derive(Error, Debug)]
pub enum Error {
    // Source resolution errors
    #[error("No playable source provided")]
    MissingSource,

    #[error("Source is not a MEDIAL share link: {url}")]
    UnrecognizedSource { url: String },

    #[error("Invalid source URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // Lifecycle errors
    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidLifecycleTransition { from: String, to: String },

    // Collaborator errors
    #[error("Embed surface error: {0}")]
    Surface(String),

    #[error("Player bridge error: {0}")]
    Bridge(String),
}

impl Error {
    /// Create a surface error from an implementation-specific message
    pub fn surface(msg: impl Into<String>) -> Self {
        Error::Surface(msg.into())
    }

    /// Create a bridge error from an implementation-specific message
    pub fn bridge(msg: impl Into<String>) -> Self {
        Error::Bridge(msg.into())
    }
}
