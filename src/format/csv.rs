//! Checkpoint files.
//!
//! Each phase persists its output as comma-separated text with a header row.
//! The column names are fixed so files exported by earlier runs (including
//! ones edited by hand in a spreadsheet) can be fed back in. Reading maps
//! columns by header name, so extra columns or a leading index column are
//! tolerated. Surrounding whitespace in cells is trimmed.

use crate::error::{BridgeError, Result};
use crate::model::{ResolvedRecord, SourceRecord};
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use std::fs;
use std::path::Path;
use tracing::info;

/// Columns written by the extract phase.
pub const EXTRACT_COLUMNS: &[&str] = &["issue_key", "origin_asset_object_key", "origin_issue_id"];

/// Columns written by the resolve phase.
pub const RESOLVE_COLUMNS: &[&str] = &[
    "server_key",
    "origin_asset_object_key",
    "cloud_asset_object_key",
    "cloud_asset_global_object_id",
];

/// Map a `csv` error to an I/O error or a checkpoint error at its line.
fn csv_error(path: &Path, err: csv::Error) -> BridgeError {
    let line = err
        .position()
        .map_or(0, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX));
    let reason = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(io) => BridgeError::Io(io),
        _ => BridgeError::checkpoint(path, line, reason),
    }
}

fn record_line(record: &StringRecord) -> usize {
    record
        .position()
        .map_or(0, |pos| usize::try_from(pos.line()).unwrap_or(usize::MAX))
}

/// Write a header and rows to `path`, creating parent directories.
fn write_table<R, I>(path: &Path, columns: &[&str], rows: I) -> Result<()>
where
    R: AsRef<[String]>,
    I: IntoIterator<Item = R>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    writer.write_record(columns).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer
            .write_record(row.as_ref())
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Rows of a checkpoint file, keyed by the requested columns.
///
/// Each row carries the 1-based line it started on.
fn read_table(path: &Path, columns: &[&str]) -> Result<Vec<(usize, Vec<String>)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let header = reader.headers().map_err(|e| csv_error(path, e))?.clone();
    if header.is_empty() {
        return Err(BridgeError::checkpoint(path, 1, "file is empty"));
    }
    let positions = columns
        .iter()
        .map(|column| {
            header
                .iter()
                .position(|name| name.trim_start_matches('\u{feff}') == *column)
                .ok_or_else(|| {
                    BridgeError::checkpoint(
                        path,
                        1,
                        format!("missing column '{column}' (expected {})", columns.join(",")),
                    )
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| csv_error(path, e))?;
        let line = record_line(&record);
        let values = positions
            .iter()
            .map(|&index| {
                record.get(index).map(str::to_string).ok_or_else(|| {
                    BridgeError::checkpoint(
                        path,
                        line,
                        format!("expected {} fields, found {}", header.len(), record.len()),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push((line, values));
    }
    Ok(rows)
}

/// Write the extract checkpoint.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_source_checkpoint(path: &Path, records: &[SourceRecord]) -> Result<()> {
    let rows = records.iter().map(|record| {
        [
            record.source_issue_key.clone(),
            record.referenced_key.clone(),
            record.source_issue_id.clone(),
        ]
    });
    write_table(path, EXTRACT_COLUMNS, rows)?;
    info!(count = records.len(), path = %path.display(), "Exported extract checkpoint");
    Ok(())
}

/// Read an extract checkpoint, preserving row order.
///
/// # Errors
///
/// Returns `Checkpoint` for a missing column or short row, `Io` if unreadable.
pub fn read_source_checkpoint(path: &Path) -> Result<Vec<SourceRecord>> {
    let rows = read_table(path, EXTRACT_COLUMNS)?;
    rows.into_iter()
        .map(|(line, mut values)| {
            let source_issue_id = values.pop().unwrap_or_default();
            let referenced_key = values.pop().unwrap_or_default();
            let source_issue_key = values.pop().unwrap_or_default();
            if source_issue_key.is_empty() || referenced_key.is_empty() {
                return Err(BridgeError::checkpoint(path, line, "issue key and asset key are required"));
            }
            Ok(SourceRecord {
                source_issue_key,
                referenced_key,
                source_issue_id,
            })
        })
        .collect()
}

/// Write the resolve checkpoint.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_resolved_checkpoint(path: &Path, records: &[ResolvedRecord]) -> Result<()> {
    let rows = records.iter().map(|record| {
        [
            record.source_issue_key.clone(),
            record.referenced_key.clone(),
            record.destination_object_key.clone(),
            record.destination_global_id.clone(),
        ]
    });
    write_table(path, RESOLVE_COLUMNS, rows)?;
    info!(count = records.len(), path = %path.display(), "Exported resolve checkpoint");
    Ok(())
}

/// Read a resolve checkpoint, preserving row order.
///
/// # Errors
///
/// Returns `Checkpoint` for a missing column, short row or empty global id.
pub fn read_resolved_checkpoint(path: &Path) -> Result<Vec<ResolvedRecord>> {
    let rows = read_table(path, RESOLVE_COLUMNS)?;
    rows.into_iter()
        .map(|(line, values)| {
            let [source_issue_key, referenced_key, destination_object_key, destination_global_id] =
                <[String; 4]>::try_from(values).map_err(|_| {
                    BridgeError::checkpoint(path, line, "expected 4 values")
                })?;
            if source_issue_key.is_empty() || destination_global_id.is_empty() {
                return Err(BridgeError::checkpoint(
                    path,
                    line,
                    "issue key and global object id are required",
                ));
            }
            Ok(ResolvedRecord {
                source_issue_key,
                referenced_key,
                destination_object_key,
                destination_global_id,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(n: usize) -> SourceRecord {
        SourceRecord {
            source_issue_key: format!("OPS-{n}"),
            referenced_key: format!("CMDB-{n}"),
            source_issue_id: format!("{}", 20_000 + n),
        }
    }

    #[test]
    fn quoted_values_survive_round_trip() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("quoted.csv");
        let records = vec![SourceRecord {
            source_issue_key: "OPS-1".to_string(),
            referenced_key: "CMDB-1,\"primary\"".to_string(),
            source_issue_id: "two\nlines".to_string(),
        }];

        write_source_checkpoint(&path, &records).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("\"CMDB-1,\"\"primary\"\"\""));
        assert_eq!(read_source_checkpoint(&path).expect("read back"), records);
    }

    #[test]
    fn reads_spreadsheet_export_with_bom_and_crlf() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("excel.csv");
        fs::write(
            &path,
            "\u{feff}issue_key,origin_asset_object_key,origin_issue_id\r\nOPS-1, CMDB-1 ,10001\r\n\r\nOPS-2,CMDB-2,10002\r\n",
        )
        .expect("write");

        let records = read_source_checkpoint(&path).expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].referenced_key, "CMDB-1");
        assert_eq!(records[1].source_issue_id, "10002");
    }

    #[test]
    fn unterminated_quote_is_checkpoint_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("broken.csv");
        fs::write(
            &path,
            "issue_key,origin_asset_object_key,origin_issue_id\nOPS-1,\"CMDB-1,10001\n",
        )
        .expect("write");
        // The open quote swallows the rest of the file, leaving a short row.
        assert!(matches!(
            read_source_checkpoint(&path),
            Err(BridgeError::Checkpoint { line: 2, .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = TempDir::new().expect("tempdir");
        let err = read_source_checkpoint(&temp.path().join("nope.csv")).expect_err("missing");
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn source_checkpoint_preserves_values_and_order() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("exports").join("Affected Server_customfield_1_x.csv");
        let records: Vec<SourceRecord> = (0..25).rev().map(source).collect();

        write_source_checkpoint(&path, &records).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("issue_key,origin_asset_object_key,origin_issue_id\n"));

        let read = read_source_checkpoint(&path).expect("read back");
        assert_eq!(read, records);
    }

    #[test]
    fn resolved_checkpoint_round_trip() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("cloud.csv");
        let records = vec![ResolvedRecord {
            source_issue_key: "OPS-1".to_string(),
            referenced_key: "CMDB-1".to_string(),
            destination_object_key: "ITAM-1".to_string(),
            destination_global_id: "b1a2:1".to_string(),
        }];
        write_resolved_checkpoint(&path, &records).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with(
            "server_key,origin_asset_object_key,cloud_asset_object_key,cloud_asset_global_object_id\n"
        ));
        assert_eq!(read_resolved_checkpoint(&path).expect("read"), records);
    }

    #[test]
    fn reads_files_with_index_column_and_reordered_columns() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("edited.csv");
        fs::write(
            &path,
            ",origin_issue_id,issue_key,origin_asset_object_key\n0,10001,OPS-1,CMDB-1\n1,10002,OPS-2,CMDB-2\n",
        )
        .expect("write");

        let records = read_source_checkpoint(&path).expect("read");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].source_issue_key, "OPS-2");
        assert_eq!(records[1].referenced_key, "CMDB-2");
        assert_eq!(records[1].source_issue_id, "10002");
    }

    #[test]
    fn wrong_checkpoint_kind_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("extract.csv");
        write_source_checkpoint(&path, &[source(1)]).expect("write");

        let err = read_resolved_checkpoint(&path).expect_err("wrong columns");
        assert!(matches!(err, BridgeError::Checkpoint { line: 1, .. }));
        assert!(err.to_string().contains("server_key"));
    }

    #[test]
    fn short_row_reports_line() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("short.csv");
        fs::write(&path, "issue_key,origin_asset_object_key,origin_issue_id\nOPS-1,CMDB-1,1\nOPS-2\n")
            .expect("write");
        let err = read_source_checkpoint(&path).expect_err("short row");
        assert!(matches!(err, BridgeError::Checkpoint { line: 3, .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("empty.csv");
        fs::write(&path, "").expect("write");
        assert!(read_source_checkpoint(&path).is_err());
    }

    #[test]
    fn header_only_file_has_no_records() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("header.csv");
        write_source_checkpoint(&path, &[]).expect("write");
        assert!(read_source_checkpoint(&path).expect("read").is_empty());
    }
}
