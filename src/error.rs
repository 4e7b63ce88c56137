//! Error types for the color_distill library

use thiserror::Error;

/// Result type alias for color_distill operations
pub type Result<T> = std::result::Result<T, DistillError>;

/// Error types for quantization and palette generation
#[derive(Error, Debug)]
pub enum DistillError {
    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}")]
    InvalidParameter { parameter: String, value: String },

    /// Image buffer contains no pixels
    #[error("Image buffer is empty")]
    EmptyImage,

    /// Image buffer is not made of whole 4-byte pixels
    #[error("Image buffer length {length} is not a multiple of 4")]
    MisalignedImage { length: usize },

    /// Sample pool too small to fill the requested palette
    #[error("Not enough valid samples to generate palette: {available} available, {requested} requested")]
    InsufficientSamples { available: usize, requested: usize },

    /// Rejection sampling never produced a color accepted by the predicate
    #[error("No valid color found after {attempts} random draws")]
    UnsatisfiablePredicate { attempts: usize },

    /// Hex color string could not be parsed
    #[error("Invalid hex color: {value}")]
    InvalidHex { value: String },

    /// Configuration file could not be read or written
    #[error("Configuration error: {message}")]
    ConfigError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DistillError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(parameter: impl Into<String>, value: impl ToString) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }

    /// Create a configuration error with context
    pub fn config<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConfigError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Check if this error indicates a recoverable condition
    ///
    /// Recoverable errors go away when the caller relaxes the palette
    /// configuration (wider bounds, more samples, looser predicate).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DistillError::InsufficientSamples { .. } | DistillError::UnsatisfiablePredicate { .. }
        )
    }

    /// Get user-friendly error description for application display
    pub fn user_message(&self) -> String {
        match self {
            DistillError::EmptyImage | DistillError::MisalignedImage { .. } => {
                "The image data is empty or malformed. Expected 4 bytes per pixel (BGRA).".to_string()
            }
            DistillError::InsufficientSamples { available, requested } => {
                format!(
                    "Only {} candidate colors fit the bounds but {} were requested. Widen the hue/chroma/lightness bounds or raise the sample count.",
                    available, requested
                )
            }
            DistillError::UnsatisfiablePredicate { .. } => {
                "No color satisfies the inclusion rule. Please relax the palette constraints.".to_string()
            }
            DistillError::InvalidParameter { parameter, value } => {
                format!("The value {} is not allowed for {}.", value, parameter)
            }
            _ => "Color processing failed. Please check the configuration and try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_message() {
        let err = DistillError::invalid_parameter("color_count", 0);
        assert_eq!(err.to_string(), "Invalid parameter: color_count = 0");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_insufficient_samples_is_recoverable() {
        let err = DistillError::InsufficientSamples { available: 3, requested: 8 };
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("3 candidate colors"));
    }

    #[test]
    fn test_config_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = DistillError::config("Failed to read config", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
