use super::CommandContext;
use crate::cli::ImportArgs;
use crate::client::{HttpTransport, Transport, fetch_field_catalog, find_field};
use crate::config::DestinationSettings;
use crate::error::Result;
use crate::format::csv::read_resolved_checkpoint;
use crate::import::Importer;
use crate::model::{FieldBinding, ResolvedRecord, RunReport};
use crate::pipeline;
use reqwest::header::HeaderMap;
use std::sync::Arc;
use tracing::info;

/// Destination field plus the importer that writes it. Built before any
/// record is processed.
pub(super) struct ImportTarget {
    pub importer: Importer,
    pub field: FieldBinding,
}

/// Execute the import command.
///
/// # Errors
///
/// Returns an error if the input is not a resolve checkpoint, the
/// destination field is unknown, or too many updates fail.
pub fn execute(args: &ImportArgs, ctx: &CommandContext) -> Result<()> {
    let records = read_resolved_checkpoint(&args.input)?;
    info!(count = records.len(), path = %args.input.display(), "Loaded resolve checkpoint");

    let target = if args.dry_run {
        offline_target(ctx, &args.field)?
    } else {
        let (destination, transport) = ctx.authenticated_destination()?;
        target(ctx, &destination, transport, &args.field, false)?
    };
    let report = apply(ctx, &target, &records);
    ctx.finish_phase(&report)
}

/// Look up `field_name` in the destination catalog and build the importer
/// on an already authenticated transport.
pub(super) fn target(
    ctx: &CommandContext,
    destination: &DestinationSettings,
    transport: Arc<dyn Transport>,
    field_name: &str,
    dry_run: bool,
) -> Result<ImportTarget> {
    let retry = ctx.retry_policy();
    let catalog = fetch_field_catalog(transport.as_ref(), &destination.url, &retry)?;
    let field = find_field(&catalog, field_name, "destination")?;
    let importer = Importer::new(transport, destination.url.clone())
        .retry(retry)
        .dry_run(dry_run);
    Ok(ImportTarget { importer, field })
}

/// Dry-run target that never contacts the destination.
///
/// The field is taken as given (name and id), so a dry run works before
/// destination credentials are configured.
pub(super) fn offline_target(ctx: &CommandContext, field_name: &str) -> Result<ImportTarget> {
    let site_url = ctx
        .settings
        .destination()
        .map(|destination| destination.url)
        .unwrap_or_default();
    let field = FieldBinding {
        field_id: field_name.trim().to_string(),
        field_display_name: field_name.trim().to_string(),
    };
    let transport = HttpTransport::new(HeaderMap::new(), ctx.settings.timeout)?;
    let importer = Importer::new(Arc::new(transport), site_url).dry_run(true);
    Ok(ImportTarget { importer, field })
}

pub(super) fn apply(
    ctx: &CommandContext,
    target: &ImportTarget,
    records: &[ResolvedRecord],
) -> RunReport {
    pipeline::run_import(
        &target.importer,
        records,
        &target.field,
        ctx.quiet || ctx.json,
    )
}
