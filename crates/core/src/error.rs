//! Error taxonomy shared by the rendering pipeline and the uploader.

use std::time::Duration;
use thiserror::Error;

/// Bad or unsupported configuration. Always recovered locally.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("unknown layout '{0}'")]
    UnknownLayout(String),

    #[error("unknown widget type '{0}'")]
    UnknownWidget(String),

    #[error("option '{key}' is invalid: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("range is empty: max ({max}) must be greater than min ({min})")]
    InvalidRange { min: f64, max: f64 },

    #[error("widget '{0}' needs an entity_id")]
    MissingEntity(String),
}

/// Failure while drawing a single slot
#[derive(Debug, Error)]
pub enum RenderError {
    /// Entity missing, unknown or unavailable
    #[error("data unavailable for {0}")]
    DataUnavailable(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cairo error: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("widget panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Failure pushing an image or command to a device
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UploadError {
    #[error("device did not answer within {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("device answered with HTTP {0}")]
    Status(u16),

    #[error("could not encode image: {0}")]
    Encode(String),

    #[error("image is {actual_width}x{actual_height}, device expects {width}x{height}")]
    Dimensions {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

impl UploadError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            UploadError::Timeout(_) | UploadError::Transport(_) => true,
            UploadError::Status(code) => *code >= 500 || *code == 408 || *code == 429,
            UploadError::Encode(_) | UploadError::Dimensions { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(UploadError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(UploadError::Status(503).is_retryable());
        assert!(!UploadError::Status(404).is_retryable());
        assert!(!UploadError::Encode("bad".into()).is_retryable());
    }

    #[test]
    fn test_config_error_converts_into_render_error() {
        let err: RenderError = ConfigError::InvalidRange { min: 5.0, max: 5.0 }.into();
        assert!(matches!(err, RenderError::Config(ConfigError::InvalidRange { .. })));
    }
}
