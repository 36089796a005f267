//! Core data types for `asset_bridge`.
//!
//! This module defines the records that flow between the migration phases:
//! - `SourceRecord` - an issue on the source tracker carrying an asset reference
//! - `ResolvedRecord` - the same issue paired with its destination asset object
//! - `FieldBinding` - a custom field resolved from a tracker's field catalog
//! - `RunProgress` - transient per-phase progress counters
//! - `RecordOutcome` / `RunReport` - per-record results and the phase summary

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// An issue on the source tracker whose asset field references an object key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub source_issue_key: String,
    pub referenced_key: String,
    pub source_issue_id: String,
}

/// A source record joined with the destination object it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRecord {
    pub source_issue_key: String,
    pub referenced_key: String,
    pub destination_object_key: String,
    pub destination_global_id: String,
}

impl ResolvedRecord {
    /// Join a source record with the destination object found for it.
    #[must_use]
    pub fn from_source(
        record: &SourceRecord,
        destination_object_key: impl Into<String>,
        destination_global_id: impl Into<String>,
    ) -> Self {
        Self {
            source_issue_key: record.source_issue_key.clone(),
            referenced_key: record.referenced_key.clone(),
            destination_object_key: destination_object_key.into(),
            destination_global_id: destination_global_id.into(),
        }
    }
}

/// A custom field as listed in a tracker's field catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    #[serde(rename = "id")]
    pub field_id: String,
    #[serde(rename = "name")]
    pub field_display_name: String,
}

/// Migration phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Extract,
    Resolve,
    Import,
}

impl Phase {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Resolve => "resolve",
            Self::Import => "import",
        }
    }

    /// Word used for a successful record in this phase's report.
    #[must_use]
    pub const fn success_label(&self) -> &'static str {
        match self {
            Self::Extract => "matched",
            Self::Resolve => "resolved",
            Self::Import => "updated",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of processing a single record in any phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Succeeded,
    /// Not an error; the record is left out of the phase output.
    Skipped { reason: String },
    Failed {
        kind: String,
        message: String,
        retryable: bool,
    },
}

impl RecordOutcome {
    #[must_use]
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn failed(err: &BridgeError) -> Self {
        Self::Failed {
            kind: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// A skipped or failed record, as listed in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    pub issue_key: String,
    pub status: String,
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

/// Summary of one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub phase: Phase,
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
    pub issues: Vec<RecordIssue>,
}

impl RunReport {
    #[must_use]
    pub const fn new(phase: Phase) -> Self {
        Self {
            phase,
            attempted: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            elapsed_secs: 0.0,
            checkpoint: None,
            dry_run: false,
            issues: Vec::new(),
        }
    }

    /// Count one record's outcome.
    pub fn record(&mut self, issue_key: &str, outcome: RecordOutcome) {
        self.attempted += 1;
        match outcome {
            RecordOutcome::Succeeded => self.succeeded += 1,
            RecordOutcome::Skipped { reason } => {
                self.skipped += 1;
                self.issues.push(RecordIssue {
                    issue_key: issue_key.to_string(),
                    status: "skipped".to_string(),
                    kind: "unmatched_reference".to_string(),
                    message: reason,
                    retryable: false,
                });
            }
            RecordOutcome::Failed {
                kind,
                message,
                retryable,
            } => {
                self.failed += 1;
                self.issues.push(RecordIssue {
                    issue_key: issue_key.to_string(),
                    status: "failed".to_string(),
                    kind,
                    message,
                    retryable,
                });
            }
        }
    }

    /// Fraction of attempted records that failed (0.0 when nothing ran).
    #[must_use]
    pub fn failure_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.failed as f64 / self.attempted as f64
        }
    }

    /// Error out when the failure rate is above `threshold`.
    ///
    /// # Errors
    ///
    /// Returns `FailureThresholdExceeded` when too many records failed.
    pub fn enforce_threshold(&self, threshold: f64) -> Result<()> {
        if self.failed > 0 && self.failure_rate() > threshold {
            return Err(BridgeError::FailureThresholdExceeded {
                phase: self.phase.to_string(),
                failed: self.failed,
                attempted: self.attempted,
                threshold,
            });
        }
        Ok(())
    }

    pub fn finish(&mut self, elapsed: Duration) {
        self.elapsed_secs = elapsed.as_secs_f64();
    }
}

/// Transient progress counters for a phase. Never persisted.
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub processed_count: usize,
    pub total_count: usize,
    pub start_time: Instant,
}

impl RunProgress {
    #[must_use]
    pub fn new(total_count: usize) -> Self {
        Self {
            processed_count: 0,
            total_count,
            start_time: Instant::now(),
        }
    }

    pub fn advance(&mut self) {
        self.processed_count += 1;
    }

    /// The server may revise the total between pages.
    pub fn set_total(&mut self, total_count: usize) {
        self.total_count = total_count;
    }

    #[must_use]
    pub fn percentage(&self) -> usize {
        if self.total_count == 0 {
            return 0;
        }
        self.processed_count * 100 / self.total_count
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// One-line progress summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Processed {} of {} [{}%] | Elapsed time: {}",
            self.processed_count,
            self.total_count,
            self.percentage(),
            crate::util::time::format_elapsed(self.elapsed())
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(key: &str) -> SourceRecord {
        SourceRecord {
            source_issue_key: key.to_string(),
            referenced_key: "CMDB-1".to_string(),
            source_issue_id: "10001".to_string(),
        }
    }

    #[test]
    fn resolved_from_source_copies_keys() {
        let resolved = ResolvedRecord::from_source(&source("OPS-1"), "ASSET-9", "gid:9");
        assert_eq!(resolved.source_issue_key, "OPS-1");
        assert_eq!(resolved.referenced_key, "CMDB-1");
        assert_eq!(resolved.destination_object_key, "ASSET-9");
        assert_eq!(resolved.destination_global_id, "gid:9");
    }

    #[test]
    fn field_binding_deserializes_catalog_entry() {
        let binding: FieldBinding =
            serde_json::from_str(r#"{"id": "customfield_10100", "name": "Affected Server", "custom": true}"#)
                .expect("parse field");
        assert_eq!(binding.field_id, "customfield_10100");
        assert_eq!(binding.field_display_name, "Affected Server");
    }

    #[test]
    fn report_counts_outcomes() {
        let mut report = RunReport::new(Phase::Resolve);
        report.record("A-1", RecordOutcome::Succeeded);
        report.record("A-2", RecordOutcome::skipped("no reference"));
        report.record(
            "A-3",
            RecordOutcome::failed(&BridgeError::LookupFailure {
                key: "CMDB-3".to_string(),
            }),
        );

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[1].kind, "lookup_failure");
    }

    #[test]
    fn threshold_allows_rate_at_limit() {
        let mut report = RunReport::new(Phase::Import);
        for i in 0..9 {
            report.record(&format!("A-{i}"), RecordOutcome::Succeeded);
        }
        report.record(
            "A-9",
            RecordOutcome::Failed {
                kind: "unexpected_status".to_string(),
                message: "HTTP 400".to_string(),
                retryable: false,
            },
        );

        assert!(report.enforce_threshold(0.1).is_ok());
        assert!(matches!(
            report.enforce_threshold(0.05),
            Err(BridgeError::FailureThresholdExceeded { failed: 1, .. })
        ));
    }

    #[test]
    fn empty_report_never_exceeds_threshold() {
        let report = RunReport::new(Phase::Extract);
        assert!(report.enforce_threshold(0.0).is_ok());
        assert!((report.failure_rate() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn progress_percentage_and_summary() {
        let mut progress = RunProgress::new(4);
        progress.advance();
        assert_eq!(progress.percentage(), 25);
        assert!(progress.summary().starts_with("Processed 1 of 4 [25%] | Elapsed time: 0h 0m"));

        let empty = RunProgress::new(0);
        assert_eq!(empty.percentage(), 0);
    }
}
