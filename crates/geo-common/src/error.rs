//! Error types for geographic primitives.

use thiserror::Error;

/// Result type alias using GeoError.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors raised while parsing or validating geographic values.
#[derive(Debug, Error, PartialEq)]
pub enum GeoError {
    #[error("Invalid bounds format: {0}. Expected 'south,west,north,east'")]
    InvalidBoundsFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid location '{value}': {message}")]
    InvalidLocation { value: String, message: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

impl GeoError {
    /// Create an InvalidLocation error.
    pub fn invalid_location(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidLocation {
            value: value.into(),
            message: message.into(),
        }
    }
}
