//! Error types for the weather overlay pipeline.

use thiserror::Error;

/// Result type alias using OverlayError.
pub type OverlayResult<T> = Result<T, OverlayError>;

/// Primary error type for overlay operations.
#[derive(Debug, Error)]
pub enum OverlayError {
    // === Configuration Errors ===
    #[error("Invalid value range: min_value ({min}) must differ from max_value ({max})")]
    InvalidRange { min: f64, max: f64 },

    #[error("Invalid geographic bounds: {0}")]
    InvalidBounds(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Overlay not found: {0}")]
    OverlayNotFound(String),

    // === Raster Errors ===
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),

    // === GPU Errors ===
    #[error("No rendering context available (tried: {})", tried.join(", "))]
    ContextUnavailable { tried: Vec<String> },

    #[error("Rendering context has been lost")]
    ContextLost,

    #[error("Invalid upload for '{label}': {message}")]
    InvalidUpload { label: String, message: String },

    #[error("GPU error: {0}")]
    GpuError(String),

    // === Event Errors ===
    #[error("Can't remove a listener: event '{0}' doesn't exist")]
    UnknownEvent(String),
}

impl OverlayError {
    /// Whether this error ends the life of the layer instance that hit it.
    ///
    /// Context and GPU failures are not retried; the owner decides whether to
    /// recreate the layer.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OverlayError::ContextUnavailable { .. }
                | OverlayError::ContextLost
                | OverlayError::InvalidUpload { .. }
                | OverlayError::GpuError(_)
        )
    }
}

// Conversion from common error types
impl From<std::io::Error> for OverlayError {
    fn from(err: std::io::Error) -> Self {
        OverlayError::ConfigError(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for OverlayError {
    fn from(err: serde_json::Error) -> Self {
        OverlayError::ConfigError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for OverlayError {
    fn from(err: serde_yaml::Error) -> Self {
        OverlayError::ConfigError(format!("YAML error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_unavailable_lists_backends() {
        let err = OverlayError::ContextUnavailable {
            tried: vec!["hardware".to_string(), "software".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No rendering context available (tried: hardware, software)"
        );
        assert!(err.is_terminal());
    }

    #[test]
    fn test_configuration_errors_are_not_terminal() {
        assert!(!OverlayError::InvalidRange { min: 1.0, max: 1.0 }.is_terminal());
        assert!(!OverlayError::UnknownEvent("update".to_string()).is_terminal());
    }
}
