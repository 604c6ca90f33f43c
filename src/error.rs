//! Error handling for Vocal EQ
//!
//! Nothing on the real-time path returns an error. These variants cover the
//! host-side surfaces: parameter lookup by name, bus layouts, state files,
//! configuration and WAV I/O.

use thiserror::Error;

/// Result type alias for Vocal EQ operations
pub type Result<T> = std::result::Result<T, EqError>;

/// Main error type for Vocal EQ operations
#[derive(Error, Debug)]
pub enum EqError {
    // Parameter Errors
    #[error("Unknown parameter: {name}")]
    UnknownParameter { name: String },

    // Host Errors
    #[error("Unsupported bus layout: {input} input / {output} output channels (mono or stereo, matching)")]
    UnsupportedLayout { input: usize, output: usize },

    // State Errors
    #[error("Invalid state record: {reason}")]
    InvalidState { reason: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid audio file: {reason}")]
    InvalidAudio {
        reason: String,
        #[source]
        source: Option<hound::Error>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EqError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            EqError::UnknownParameter { .. } => "UNKNOWN_PARAMETER",
            EqError::UnsupportedLayout { .. } => "UNSUPPORTED_LAYOUT",
            EqError::InvalidState { .. } => "INVALID_STATE",
            EqError::InvalidConfig { .. } => "INVALID_CONFIG",
            EqError::FileNotFound { .. } => "FILE_NOT_FOUND",
            EqError::InvalidAudio { .. } => "INVALID_AUDIO",
            EqError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            EqError::Io(_) => "IO_ERROR",
            EqError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Check if this error is recoverable
    ///
    /// A bad state record or layout can be answered by falling back to
    /// defaults or another layout; broken files and I/O cannot.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EqError::UnknownParameter { .. }
                | EqError::UnsupportedLayout { .. }
                | EqError::InvalidState { .. }
                | EqError::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = EqError::UnknownParameter {
            name: "gain".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_PARAMETER");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_layout_error_message() {
        let err = EqError::UnsupportedLayout {
            input: 2,
            output: 6,
        };
        assert!(err.to_string().contains("6 output"));
        assert_eq!(err.error_code(), "UNSUPPORTED_LAYOUT");
    }

    #[test]
    fn test_io_error_not_recoverable() {
        let err = EqError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_recoverable());
    }
}
