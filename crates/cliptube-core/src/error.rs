//! Error types for Cliptube core operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Cliptube core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration value missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication with the video host failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The configured recordings root does not exist.
    #[error("Recordings path not found: {0}")]
    RecordingsRootNotFound(PathBuf),

    /// File system operation failed.
    #[error("File system error at {path}: {message}")]
    FileSystem {
        /// Path where the error occurred.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Upload of a single video failed for good.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The daily API quota is exhausted; further uploads cannot succeed
    /// until the quota window resets.
    #[error("API quota exhausted - uploads cannot continue in this quota window")]
    QuotaExceeded,

    /// The run was interrupted before completion.
    #[error("Run interrupted")]
    Interrupted,

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = Error::Configuration("bad visibility".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad visibility");
    }

    #[test]
    fn test_root_not_found_display() {
        let err = Error::RecordingsRootNotFound(PathBuf::from("/mnt/recordings"));
        assert!(err.to_string().contains("/mnt/recordings"));
    }

    #[test]
    fn test_file_system_error_display() {
        let err = Error::FileSystem {
            path: PathBuf::from("/test/path"),
            message: "permission denied".to_string(),
        };
        assert!(err.to_string().contains("/test/path"));
        assert!(err.to_string().contains("permission denied"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_api_error_conversion() {
        let err: Error = ApiError::QuotaExceeded.into();
        assert!(matches!(err, Error::Api(ApiError::QuotaExceeded)));
    }
}
