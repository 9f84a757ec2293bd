//! Typed errors for the menu import library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.
//!
//! Two failure kinds are deliberately absent: malformed model output
//! degrades to an empty zero-confidence extraction, and hallucinated
//! references are nulled by the reference guard. Neither surfaces here.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use crate::types::job::JobStatus;

/// Errors that can occur during import operations.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The declared file type is not one of xlsx, csv, json, md, txt
    #[error("unsupported file type: {file_type}")]
    UnsupportedFileType { file_type: String },

    /// The uploaded bytes could not be decoded as the declared type
    #[error("document error: {0}")]
    Document(String),

    /// No import job exists with this id
    #[error("import job not found: {job_id}")]
    JobNotFound { job_id: Uuid },

    /// Apply attempted on a job that is not READY
    #[error("import job {job_id} is not ready (status: {status})")]
    JobNotReady { job_id: Uuid, status: JobStatus },

    /// The job belongs to a different store than the caller
    #[error("import job {job_id} does not belong to store {store_id}")]
    StoreOwnershipMismatch { job_id: Uuid, store_id: String },

    /// AI service unavailable or failed
    #[error("AI service error: {0}")]
    Ai(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Model call exceeded the configured timeout on every attempt
    #[error("model call timed out after {attempts} attempt(s) of {timeout:?}")]
    Timeout { attempts: u32, timeout: Duration },

    /// Storage operation failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl ImportError {
    /// Build an AI error from a message.
    pub fn ai(message: impl Into<String>) -> Self {
        Self::Ai(message.into().into())
    }

    /// Build a storage error from a message.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into().into())
    }

    /// Whether a model call that failed with this error may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Ai(_) | Self::Timeout { .. })
    }
}

/// Result type alias for import operations.
pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_errors_are_retryable() {
        assert!(ImportError::ai("rate limited").is_retryable());
        assert!(ImportError::Timeout {
            attempts: 1,
            timeout: Duration::from_secs(1)
        }
        .is_retryable());
        assert!(!ImportError::storage("disk full").is_retryable());
        assert!(!ImportError::Config("missing key".into()).is_retryable());
    }

    #[test]
    fn test_error_messages_are_verbatim() {
        let err = ImportError::UnsupportedFileType {
            file_type: "pdf".into(),
        };
        assert_eq!(err.to_string(), "unsupported file type: pdf");

        let err = ImportError::ai("upstream exploded");
        assert_eq!(err.to_string(), "AI service error: upstream exploded");
    }
}
