//! Structured error output for operators and automation.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::BridgeError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Tracker Errors ===
    /// Destination login check failed
    AuthenticationFailed,
    /// HTTP 429 persisted after the retry
    RateLimited,
    /// Request timed out
    Timeout,
    /// Connection-level failure
    TransportError,
    /// Tracker returned an unexpected status
    UnexpectedStatus,
    /// Tracker returned a body we could not decode
    MalformedResponse,
    /// No destination object for an original key
    LookupFailed,
    /// Field missing from the catalog
    FieldNotFound,

    // === Run Errors ===
    /// Checkpoint file is malformed
    CheckpointInvalid,
    /// Phase failure rate above threshold
    FailureThresholdExceeded,

    // === Config Errors ===
    /// Configuration error
    ConfigError,

    // === I/O Errors ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::RateLimited => "RATE_LIMITED",
            Self::Timeout => "TIMEOUT",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::UnexpectedStatus => "UNEXPECTED_STATUS",
            Self::MalformedResponse => "MALFORMED_RESPONSE",
            Self::LookupFailed => "LOOKUP_FAILED",
            Self::FieldNotFound => "FIELD_NOT_FOUND",
            Self::CheckpointInvalid => "CHECKPOINT_INVALID",
            Self::FailureThresholdExceeded => "FAILURE_THRESHOLD_EXCEEDED",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether re-running the same command later might succeed unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::Timeout | Self::TransportError
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Authentication errors
    /// - 3: Lookup/field errors
    /// - 6: Checkpoint errors
    /// - 7: Config errors
    /// - 8: I/O errors
    /// - 9: Failure threshold exceeded
    /// - 10: Network/tracker errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::AuthenticationFailed => 2,
            Self::LookupFailed | Self::FieldNotFound => 3,
            Self::CheckpointInvalid => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::FailureThresholdExceeded => 9,
            Self::RateLimited
            | Self::Timeout
            | Self::TransportError
            | Self::UnexpectedStatus
            | Self::MalformedResponse => 10,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `BridgeError`.
    #[must_use]
    pub fn from_error(err: &BridgeError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);

        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &BridgeError) -> (ErrorCode, Option<Value>) {
        match err {
            BridgeError::Authentication { site, status, .. } => (
                ErrorCode::AuthenticationFailed,
                Some(json!({"site": site, "status": status})),
            ),
            BridgeError::RateLimited { url, attempts } => (
                ErrorCode::RateLimited,
                Some(json!({"url": url, "attempts": attempts})),
            ),
            BridgeError::Timeout { url } => (ErrorCode::Timeout, Some(json!({"url": url}))),
            BridgeError::Transport { url, .. } => {
                (ErrorCode::TransportError, Some(json!({"url": url})))
            }
            BridgeError::UnexpectedStatus { url, status, .. } => (
                ErrorCode::UnexpectedStatus,
                Some(json!({"url": url, "status": status})),
            ),
            BridgeError::MalformedResponse { url, .. } => {
                (ErrorCode::MalformedResponse, Some(json!({"url": url})))
            }
            BridgeError::LookupFailure { key } => {
                (ErrorCode::LookupFailed, Some(json!({"original_key": key})))
            }
            BridgeError::FieldNotFound { side, name } => (
                ErrorCode::FieldNotFound,
                Some(json!({"side": side, "name": name})),
            ),
            BridgeError::Checkpoint { path, line, .. } => (
                ErrorCode::CheckpointInvalid,
                Some(json!({"path": path.display().to_string(), "line": line})),
            ),
            BridgeError::FailureThresholdExceeded {
                phase,
                failed,
                attempted,
                threshold,
            } => (
                ErrorCode::FailureThresholdExceeded,
                Some(json!({
                    "phase": phase,
                    "failed": failed,
                    "attempted": attempted,
                    "threshold": threshold,
                })),
            ),
            BridgeError::Config(_) => (ErrorCode::ConfigError, None),
            BridgeError::Io(_) => (ErrorCode::IoError, None),
            BridgeError::Json(_) => (ErrorCode::JsonError, None),
            BridgeError::Yaml(_) => (ErrorCode::YamlError, None),
            BridgeError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
