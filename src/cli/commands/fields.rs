use super::CommandContext;
use crate::cli::{FieldsArgs, Side};
use crate::client::fetch_field_catalog;
use crate::error::Result;
use crate::format::format_field_table;
use crate::model::FieldBinding;
use tracing::info;

/// Execute the fields command.
///
/// # Errors
///
/// Returns an error if the tracker's settings are missing or the catalog
/// request fails.
pub fn execute(args: &FieldsArgs, ctx: &CommandContext) -> Result<()> {
    let (base_url, transport) = match args.side {
        Side::Source => {
            let (source, transport) = ctx.source_transport()?;
            (source.url, transport)
        }
        Side::Destination => {
            let (destination, transport) = ctx.destination_transport()?;
            (destination.url, transport)
        }
    };

    let catalog = fetch_field_catalog(transport.as_ref(), &base_url, &ctx.retry_policy())?;
    let fields = filter_fields(catalog, args.filter.as_deref());
    info!(side = args.side.as_str(), count = fields.len(), "Listed fields");

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&fields)?);
    } else if fields.is_empty() {
        println!("No fields found.");
    } else {
        print!("{}", format_field_table(&fields));
    }
    Ok(())
}

/// Keep fields whose name or id contains `filter`, sorted by name.
fn filter_fields(catalog: Vec<FieldBinding>, filter: Option<&str>) -> Vec<FieldBinding> {
    let needle = filter.map(str::to_lowercase);
    let mut fields: Vec<FieldBinding> = catalog
        .into_iter()
        .filter(|field| {
            needle.as_ref().is_none_or(|needle| {
                field.field_display_name.to_lowercase().contains(needle)
                    || field.field_id.to_lowercase().contains(needle)
            })
        })
        .collect();
    fields.sort_by(|a, b| a.field_display_name.cmp(&b.field_display_name));
    fields
}
