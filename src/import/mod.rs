//! Importer: writes the destination asset link onto the destination issue.

use crate::client::{ApiRequest, RetryPolicy, Transport, send_with_retry};
use crate::error::Result;
use crate::model::{FieldBinding, ResolvedRecord};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, info};

/// Status the issue endpoint returns for a successful edit.
pub const NO_CONTENT: u16 = 204;

/// Edit payload replacing the field with a single object reference.
///
/// The whole field value is replaced, so applying the same update twice
/// leaves the issue in the same state.
#[must_use]
pub fn update_payload(field_id: &str, global_id: &str) -> Value {
    let mut fields = Map::new();
    fields.insert(field_id.to_string(), json!([{ "id": global_id }]));
    json!({ "fields": fields })
}

/// Applies field updates to destination issues.
pub struct Importer {
    transport: Arc<dyn Transport>,
    site_url: String,
    retry: RetryPolicy,
    dry_run: bool,
}

impl Importer {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, site_url: impl Into<String>) -> Self {
        Self {
            transport,
            site_url: site_url.into(),
            retry: RetryPolicy::default(),
            dry_run: false,
        }
    }

    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log the payloads instead of sending them.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    #[must_use]
    pub fn issue_url(&self, issue_key: &str) -> String {
        format!("{}/rest/api/3/issue/{issue_key}", self.site_url)
    }

    /// PUT the asset reference onto the issue with the record's key.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedStatus` for anything but 204, `RateLimited` if the
    /// retry is also rate limited, or the transport error.
    pub fn apply_update(&self, record: &ResolvedRecord, field: &FieldBinding) -> Result<()> {
        let url = self.issue_url(&record.source_issue_key);
        let payload = update_payload(&field.field_id, &record.destination_global_id);

        if self.dry_run {
            info!(issue = %record.source_issue_key, url = %url, payload = %payload, "Dry run, not sending");
            return Ok(());
        }

        let response = send_with_retry(
            self.transport.as_ref(),
            &ApiRequest::put(&url, payload),
            &self.retry,
        )?;
        if response.status != NO_CONTENT {
            return Err(response.unexpected(&url));
        }
        debug!(
            issue = %record.source_issue_key,
            object_key = %record.destination_object_key,
            "Updated issue"
        );
        Ok(())
    }
}
