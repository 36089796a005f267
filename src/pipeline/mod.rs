//! Pipeline Driver: EXTRACT -> RESOLVE -> IMPORT.
//!
//! Each phase produces a `RunReport` and, for extract and resolve, a
//! checkpoint file. Phases never re-enter; an operator resumes by handing a
//! checkpoint to the next phase's command. The failure-rate threshold is
//! enforced by the caller after the checkpoint has been written, so the good
//! records are never lost to a bad one.

pub mod pool;

pub use pool::map_parallel;

use crate::error::Result;
use crate::format::csv::{write_resolved_checkpoint, write_source_checkpoint};
use crate::import::Importer;
use crate::model::{
    FieldBinding, Phase, RecordOutcome, ResolvedRecord, RunReport, SourceRecord,
};
use crate::resolve::Resolver;
use crate::source::SourceReader;
use crate::util::progress::ProgressTracker;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Default extract checkpoint: `{export_dir}/{field name}_{field id}_{stamp}.csv`.
#[must_use]
pub fn extract_checkpoint_path(export_dir: &Path, field: &FieldBinding, stamp: &str) -> PathBuf {
    let name: String = field
        .field_display_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    export_dir.join(format!("{name}_{}_{stamp}.csv", field.field_id))
}

/// Default resolve checkpoint: the extract checkpoint's name with `_cloud`.
#[must_use]
pub fn resolve_checkpoint_path(extract_path: &Path) -> PathBuf {
    let stem = extract_path
        .file_stem()
        .map_or_else(|| "checkpoint".to_string(), |s| s.to_string_lossy().to_string());
    extract_path.with_file_name(format!("{stem}_cloud.csv"))
}

/// EXTRACT: read the source tracker and write the extract checkpoint.
///
/// # Errors
///
/// Returns the source reader's error (fail fast) or a write error.
pub fn run_extract(
    reader: &SourceReader,
    search_filter: &str,
    field: &FieldBinding,
    output: &Path,
) -> Result<(Vec<SourceRecord>, RunReport)> {
    let extraction = reader.fetch_all(search_filter, &field.field_id)?;
    write_source_checkpoint(output, &extraction.records)?;
    let mut report = extraction.report;
    report.checkpoint = Some(output.display().to_string());
    Ok((extraction.records, report))
}

/// RESOLVE: look up every record on `workers` threads.
///
/// Returns the resolved records in input order; failures are in the report.
pub fn run_resolve(
    resolver: &Resolver,
    records: Vec<SourceRecord>,
    workers: usize,
    quiet: bool,
) -> (Vec<ResolvedRecord>, RunReport) {
    let started = Instant::now();
    let mut report = RunReport::new(Phase::Resolve);
    let mut tracker = ProgressTracker::new(records.len(), "Resolving asset objects", quiet);
    info!(count = records.len(), workers, "Resolving destination objects");

    let results = map_parallel(
        records,
        workers,
        |record| {
            let outcome = resolver.resolve(&record);
            (record, outcome)
        },
        |_, (record, outcome)| {
            if let Err(err) = outcome {
                warn!(issue = %record.source_issue_key, reference = %record.referenced_key, error = %err, "Lookup failed");
            }
            tracker.inc();
        },
    );
    tracker.finish_and_clear();

    let mut resolved = Vec::with_capacity(results.len());
    for (record, outcome) in results {
        match outcome {
            Ok(found) => {
                report.record(&record.source_issue_key, RecordOutcome::Succeeded);
                resolved.push(found);
            }
            Err(err) => report.record(&record.source_issue_key, RecordOutcome::failed(&err)),
        }
    }

    report.finish(started.elapsed());
    info!(
        resolved = report.succeeded,
        failed = report.failed,
        "Resolve complete"
    );
    (resolved, report)
}

/// RESOLVE plus writing the resolve checkpoint.
///
/// # Errors
///
/// Returns an error only if the checkpoint cannot be written.
pub fn run_resolve_to(
    resolver: &Resolver,
    records: Vec<SourceRecord>,
    workers: usize,
    quiet: bool,
    output: &Path,
) -> Result<(Vec<ResolvedRecord>, RunReport)> {
    let (resolved, mut report) = run_resolve(resolver, records, workers, quiet);
    write_resolved_checkpoint(output, &resolved)?;
    report.checkpoint = Some(output.display().to_string());
    Ok((resolved, report))
}

/// IMPORT: apply each update in order on the calling thread.
pub fn run_import(
    importer: &Importer,
    records: &[ResolvedRecord],
    field: &FieldBinding,
    quiet: bool,
) -> RunReport {
    let started = Instant::now();
    let mut report = RunReport::new(Phase::Import);
    report.dry_run = importer.is_dry_run();
    let mut tracker = ProgressTracker::new(records.len(), "Updating destination issues", quiet);
    info!(
        count = records.len(),
        field = %field.field_id,
        dry_run = report.dry_run,
        "Importing asset links"
    );

    for record in records {
        let outcome = match importer.apply_update(record, field) {
            Ok(()) => RecordOutcome::Succeeded,
            Err(err) => {
                warn!(issue = %record.source_issue_key, error = %err, "Update failed");
                RecordOutcome::failed(&err)
            }
        };
        report.record(&record.source_issue_key, outcome);
        tracker.inc();
    }

    tracker.finish_and_clear();
    report.finish(started.elapsed());
    info!(
        updated = report.succeeded,
        failed = report.failed,
        "Import complete"
    );
    report
}
