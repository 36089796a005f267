//! Error types and handling for `asset_bridge`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Distinguishes transient (retryable) from permanent failures so the
//!   pipeline can turn a single bad record into a reported outcome
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for automation

mod structured;

pub use structured::{ErrorCode, StructuredError};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `asset_bridge` operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    // === Tracker Errors ===
    /// Destination credentials were rejected by the login check.
    #[error("Authentication failed against {site}: HTTP {status}: {body}")]
    Authentication {
        site: String,
        status: u16,
        body: String,
    },

    /// The tracker kept answering HTTP 429 after the bounded retry.
    #[error("Rate limited by {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out")]
    Timeout { url: String },

    /// Connection-level failure (DNS, TLS, reset).
    #[error("Transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    /// The tracker answered with a status the caller does not accept.
    #[error("Unexpected HTTP {status} from {url}: {body}")]
    UnexpectedStatus {
        url: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded into the expected shape.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    /// No destination object carries the requested original key.
    #[error("No destination object found for original key {key}")]
    LookupFailure { key: String },

    /// A field name or id is not present in the tracker's field catalog.
    #[error("Field not found in {side} catalog: {name}")]
    FieldNotFound { side: String, name: String },

    // === Checkpoint Errors ===
    /// A checkpoint file has an unexpected header or a malformed row.
    #[error("Checkpoint error in '{path}' at line {line}: {reason}")]
    Checkpoint {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    // === Run Errors ===
    /// Too many records failed in a phase.
    #[error("{phase} phase failed for {failed} of {attempted} records (threshold {threshold})")]
    FailureThresholdExceeded {
        phase: String,
        failed: usize,
        attempted: usize,
        threshold: f64,
    },

    // === Configuration Errors ===
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Could retrying the same request later plausibly succeed?
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-friendly label for the failure kind, used in reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "authentication",
            Self::RateLimited { .. } => "rate_limited",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport",
            Self::UnexpectedStatus { .. } => "unexpected_status",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::LookupFailure { .. } => "lookup_failure",
            Self::FieldNotFound { .. } => "field_not_found",
            Self::Checkpoint { .. } => "checkpoint",
            Self::FailureThresholdExceeded { .. } => "failure_threshold",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Yaml(_) => "yaml",
            Self::Other(_) => "other",
        }
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::Authentication { .. } => {
                Some("Check CLOUD_EMAIL and CLOUD_TOKEN for the destination site")
            }
            Self::RateLimited { .. } => Some("Wait a few minutes and re-run the same phase"),
            Self::Timeout { .. } => Some("Raise --timeout-secs or reduce --workers"),
            Self::FieldNotFound { .. } => Some("Run: asset-bridge fields --side <side>"),
            Self::FailureThresholdExceeded { .. } => Some(
                "Inspect the report, fix the failing records, and re-run the phase on a trimmed checkpoint",
            ),
            Self::Config(_) => Some("Set the value in .env, the config file, or a CLI flag"),
            _ => None,
        }
    }

    /// Create a checkpoint error for a specific file line.
    #[must_use]
    pub fn checkpoint(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}

/// Result type using `BridgeError`.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::LookupFailure {
            key: "CMDB-42".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No destination object found for original key CMDB-42"
        );
    }

    #[test]
    fn test_retryable_classification() {
        let limited = BridgeError::RateLimited {
            url: "https://x".to_string(),
            attempts: 2,
        };
        assert!(limited.is_retryable());

        let server = BridgeError::UnexpectedStatus {
            url: "https://x".to_string(),
            status: 503,
            body: String::new(),
        };
        assert!(server.is_retryable());

        let client = BridgeError::UnexpectedStatus {
            url: "https://x".to_string(),
            status: 400,
            body: String::new(),
        };
        assert!(!client.is_retryable());

        let missing = BridgeError::LookupFailure {
            key: "A-1".to_string(),
        };
        assert!(!missing.is_retryable());
    }

    #[test]
    fn test_suggestion() {
        let err = BridgeError::Config("missing source.url".to_string());
        assert!(err.suggestion().is_some());
        let err = BridgeError::LookupFailure {
            key: "A-1".to_string(),
        };
        assert_eq!(err.suggestion(), None);
    }

    #[test]
    fn test_checkpoint_helper() {
        let err = BridgeError::checkpoint("a.csv", 3, "expected 3 columns");
        assert_eq!(
            err.to_string(),
            "Checkpoint error in 'a.csv' at line 3: expected 3 columns"
        );
    }
}
