//! Resolver: maps a source asset key to its destination asset object.
//!
//! Destination objects created by the asset migration carry the source key
//! in their "Original Object Key" attribute, so one object-search query per
//! record finds the match.

use crate::client::{ApiRequest, RetryPolicy, Transport, send_with_retry};
use crate::error::{BridgeError, Result};
use crate::model::{ResolvedRecord, SourceRecord};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Attribute on destination objects that records the source object key.
pub const ORIGINAL_KEY_ATTRIBUTE: &str = "Original Object Key";

#[derive(Debug, Deserialize)]
struct ObjectSearch {
    #[serde(default)]
    values: Vec<AssetObject>,
}

#[derive(Debug, Deserialize)]
struct AssetObject {
    #[serde(rename = "objectKey")]
    object_key: String,
    #[serde(rename = "globalId")]
    global_id: String,
}

/// Object-search body selecting objects whose original key is `referenced_key`.
#[must_use]
pub fn lookup_query(referenced_key: &str) -> Value {
    json!({ "qlQuery": format!("\"{ORIGINAL_KEY_ATTRIBUTE}\" = {referenced_key}") })
}

/// Looks up destination objects. Holds no per-record state, so one instance
/// is shared by every worker.
pub struct Resolver {
    transport: Arc<dyn Transport>,
    lookup_url: String,
    retry: RetryPolicy,
}

impl Resolver {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, lookup_url: impl Into<String>) -> Self {
        Self {
            transport,
            lookup_url: lookup_url.into(),
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub const fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Find the destination object for `record`. The first match wins.
    ///
    /// # Errors
    ///
    /// - `LookupFailure` when the search returns no objects
    /// - `RateLimited` when the retry is also answered with 429
    /// - `UnexpectedStatus` / `MalformedResponse` for other bad answers
    pub fn resolve(&self, record: &SourceRecord) -> Result<ResolvedRecord> {
        let request = ApiRequest::post(&self.lookup_url, lookup_query(&record.referenced_key));
        let response = send_with_retry(self.transport.as_ref(), &request, &self.retry)?;
        if response.status != 200 {
            return Err(response.unexpected(&self.lookup_url));
        }

        let search: ObjectSearch = response.json(&self.lookup_url)?;
        let object = search
            .values
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::LookupFailure {
                key: record.referenced_key.clone(),
            })?;

        debug!(
            issue = %record.source_issue_key,
            reference = %record.referenced_key,
            object_key = %object.object_key,
            global_id = %object.global_id,
            "Resolved destination object"
        );
        Ok(ResolvedRecord::from_source(
            record,
            object.object_key,
            object.global_id,
        ))
    }
}
