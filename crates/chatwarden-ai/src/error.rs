//! Error types for the generation backend.

use thiserror::Error;

/// Failure classes of the generation backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Invalid or missing credentials. At startup this demotes the responder
    /// to fallback mode; it is never fatal.
    #[error("invalid backend credentials: {0}")]
    Config(String),

    /// Account quota exhausted. Triggers the permanent fallback demotion.
    #[error("backend quota exceeded: {0}")]
    Quota(String),

    /// Request rate exceeded. Triggers the permanent fallback demotion.
    #[error("backend rate limited (retry after {retry_after_secs:?}s)")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Anything else: network trouble, 5xx, malformed responses. Answered
    /// with an apology; availability state is unchanged.
    #[error("transient backend failure: {0}")]
    Transient(String),
}

impl BackendError {
    /// Whether this failure flips the responder into permanent fallback.
    pub fn demotes(&self) -> bool {
        matches!(self, Self::Quota(_) | Self::RateLimited { .. })
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transient(e.to_string())
    }
}

/// Result type alias for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
