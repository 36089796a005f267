//! Tracker metadata lookups: field catalog and the destination login check.

use super::{ApiRequest, RetryPolicy, Transport, send_with_retry};
use crate::error::{BridgeError, Result};
use crate::model::FieldBinding;
use serde::Deserialize;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct Myself {
    #[serde(rename = "displayName")]
    display_name: String,
}

/// Fetch every field the tracker knows about (`GET /rest/api/2/field`).
///
/// # Errors
///
/// Returns an error for a non-200 status or an unparsable body.
pub fn fetch_field_catalog(
    transport: &dyn Transport,
    base_url: &str,
    retry: &RetryPolicy,
) -> Result<Vec<FieldBinding>> {
    let url = format!("{base_url}/rest/api/2/field");
    let response = send_with_retry(transport, &ApiRequest::get(&url), retry)?;
    if response.status != 200 {
        return Err(response.unexpected(&url));
    }
    let fields: Vec<FieldBinding> = response.json(&url)?;
    debug!(count = fields.len(), url = %url, "Loaded field catalog");
    Ok(fields)
}

/// Find a field by exact display name, falling back to its id.
///
/// # Errors
///
/// Returns `FieldNotFound` if neither matches.
pub fn find_field(catalog: &[FieldBinding], name_or_id: &str, side: &str) -> Result<FieldBinding> {
    let wanted = name_or_id.trim();
    catalog
        .iter()
        .find(|field| field.field_display_name == wanted)
        .or_else(|| catalog.iter().find(|field| field.field_id == wanted))
        .cloned()
        .map(|field| {
            info!(side, id = %field.field_id, name = %field.field_display_name, "Field found");
            field
        })
        .ok_or_else(|| BridgeError::FieldNotFound {
            side: side.to_string(),
            name: wanted.to_string(),
        })
}

/// Verify destination credentials (`GET /rest/api/3/myself`).
///
/// Returns the account's display name.
///
/// # Errors
///
/// Returns `Authentication` for any non-200 status.
pub fn check_destination_login(
    transport: &dyn Transport,
    site_url: &str,
    retry: &RetryPolicy,
) -> Result<String> {
    let url = format!("{site_url}/rest/api/3/myself");
    let response = send_with_retry(transport, &ApiRequest::get(&url), retry)?;
    if response.status != 200 {
        return Err(BridgeError::Authentication {
            site: site_url.to_string(),
            status: response.status,
            body: response.body,
        });
    }
    let me: Myself = response.json(&url)?;
    info!(site = %site_url, user = %me.display_name, "Authenticated to destination");
    Ok(me.display_name)
}
