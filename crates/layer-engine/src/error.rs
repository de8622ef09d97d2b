//! Error types for the layer engine.

use geo_common::GeoError;
use thiserror::Error;

/// Errors that can occur while rendering map layers.
///
/// Cancellation is not an error: a superseded render resolves to
/// `RenderOutcome::Cancelled`, never to an error.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The layer was never registered, or was unregistered.
    #[error("layer not found: {0}")]
    LayerNotFound(String),

    /// Network or transport failure talking to the search backend.
    #[error("backend request failed: {0}")]
    Backend(String),

    /// The search backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {message}")]
    BackendStatus { status: u16, message: String },

    /// The backend did not answer in time.
    #[error("backend request timed out")]
    Timeout,

    /// The backend answered with a payload we could not interpret.
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// Layer or engine configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid geographic input.
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl EngineError {
    /// Create a Backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an InvalidResponse error.
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether this error stems from layer configuration rather than I/O.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        match err.status() {
            Some(status) => Self::BackendStatus {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => Self::InvalidResponse(err.to_string()),
            None => Self::Backend(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Result type for layer engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
