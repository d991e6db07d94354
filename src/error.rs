//! Error types for CardHub Gateway

use std::io;

use thiserror::Error;

/// Result type alias for CardHub Gateway
pub type Result<T> = std::result::Result<T, Error>;

/// CardHub Gateway errors
///
/// Domain errors with an HTTP contract of their own live next to their
/// modules ([`crate::oauth::FlowError`], [`crate::offers::OffersError`]);
/// this enum covers everything else.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
