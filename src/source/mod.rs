//! Source Reader: paginated issue search on the self-hosted tracker.
//!
//! Each issue's asset field holds display text such as
//! `"web-01 (CMDB-1234)"`; the parenthesized token is the asset's object key
//! in the source system. Issues whose field text has no such token are
//! reported as skipped and left out of the extract checkpoint.

use crate::client::{ApiRequest, RetryPolicy, Transport, send_with_retry};
use crate::error::{BridgeError, Result};
use crate::model::{Phase, RecordOutcome, RunReport, SourceRecord};
use crate::util::progress::ProgressTracker;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::{Arc, LazyLock};
use std::time::Instant;
use tracing::{debug, info};

/// Default number of issues requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

static REFERENCE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\w+-\d+)\)").expect("valid reference key regex"));

/// Extract the asset object key from field text: the first `(WORD-DIGITS)`.
#[must_use]
pub fn extract_reference_key(text: &str) -> Option<&str> {
    REFERENCE_KEY
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    total: usize,
    #[serde(default)]
    issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    id: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// First string of the field value. Asset fields come back as a list of
/// display strings; a bare string is accepted as well.
fn field_text<'a>(fields: &'a Map<String, Value>, field_id: &str) -> Option<&'a str> {
    match fields.get(field_id)? {
        Value::Array(values) => values.first().and_then(Value::as_str),
        Value::String(text) => Some(text.as_str()),
        _ => None,
    }
}

/// Records found by one extract run, plus its report.
#[derive(Debug)]
pub struct Extraction {
    pub records: Vec<SourceRecord>,
    pub report: RunReport,
}

/// Reads issues carrying an asset reference from the source tracker.
pub struct SourceReader {
    transport: Arc<dyn Transport>,
    base_url: String,
    page_size: usize,
    retry: RetryPolicy,
    quiet: bool,
}

impl SourceReader {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            retry: RetryPolicy::default(),
            quiet: false,
        }
    }

    #[must_use]
    pub const fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Page through `search_filter` until the server-reported total is
    /// reached, extracting one record per matching issue in result order.
    ///
    /// # Errors
    ///
    /// Fails fast on the first non-200 page or unparsable body; nothing
    /// partial is returned.
    pub fn fetch_all(&self, search_filter: &str, field_id: &str) -> Result<Extraction> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let started = Instant::now();
        let mut records = Vec::new();
        let mut report = RunReport::new(Phase::Extract);
        let mut tracker = ProgressTracker::new(0, "Reading source issues", self.quiet);

        let mut start_at = 0;
        let mut total = 1;
        info!(jql = %search_filter, field = %field_id, "Searching source issues");

        while start_at < total {
            let request = ApiRequest::get(&url)
                .query("jql", search_filter)
                .query("fields", field_id)
                .query("maxResults", self.page_size)
                .query("startAt", start_at);
            let response = send_with_retry(self.transport.as_ref(), &request, &self.retry)?;
            if response.status != 200 {
                return Err(response.unexpected(&url));
            }
            let page: SearchPage = response.json(&url)?;

            // The server may cap the page below `maxResults`; advance by what
            // actually came back.
            total = page.total;
            if page.issues.is_empty() && start_at < total {
                return Err(BridgeError::MalformedResponse {
                    url,
                    reason: format!("empty page at startAt {start_at} before reaching total {total}"),
                });
            }
            start_at += page.issues.len();
            tracker.set_total(total);
            debug!(start_at, total, returned = page.issues.len(), "Fetched page");

            for issue in page.issues {
                let outcome = match field_text(&issue.fields, field_id) {
                    Some(text) => match extract_reference_key(text) {
                        Some(key) => {
                            debug!(issue = %issue.key, reference = %key, "Found reference key");
                            records.push(SourceRecord {
                                source_issue_key: issue.key.clone(),
                                referenced_key: key.to_string(),
                                source_issue_id: issue.id.clone(),
                            });
                            RecordOutcome::Succeeded
                        }
                        None => RecordOutcome::skipped(format!(
                            "no (KEY-123) reference in field text: {text}"
                        )),
                    },
                    None => RecordOutcome::skipped("field is empty or not text"),
                };
                if let RecordOutcome::Skipped { reason } = &outcome {
                    debug!(issue = %issue.key, reason = %reason, "Skipping issue");
                }
                report.record(&issue.key, outcome);
                tracker.inc();
            }
        }

        tracker.finish_and_clear();
        report.finish(started.elapsed());
        info!(
            matched = report.succeeded,
            skipped = report.skipped,
            total,
            "Source search complete"
        );
        Ok(Extraction { records, report })
    }
}
