use super::CommandContext;
use crate::cli::ResolveArgs;
use crate::client::Transport;
use crate::config::DestinationSettings;
use crate::error::Result;
use crate::format::csv::read_source_checkpoint;
use crate::model::{ResolvedRecord, RunReport, SourceRecord};
use crate::pipeline::{self, resolve_checkpoint_path};
use crate::resolve::Resolver;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Execute the resolve command.
///
/// # Errors
///
/// Returns an error if the input is not an extract checkpoint, the
/// destination rejects the credentials, or too many lookups fail.
pub fn execute(args: &ResolveArgs, ctx: &CommandContext) -> Result<()> {
    let records = read_source_checkpoint(&args.input)?;
    info!(count = records.len(), path = %args.input.display(), "Loaded extract checkpoint");

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| resolve_checkpoint_path(&args.input));
    let (destination, transport) = ctx.authenticated_destination()?;
    let resolver = resolver(ctx, &destination, transport);
    let (_, report) = resolve(ctx, &resolver, records, &output)?;
    ctx.finish_phase(&report)
}

/// Resolver for the destination's object-search endpoint.
pub(super) fn resolver(
    ctx: &CommandContext,
    destination: &DestinationSettings,
    transport: Arc<dyn Transport>,
) -> Resolver {
    Resolver::new(transport, destination.asset_endpoint.clone()).retry(ctx.retry_policy())
}

/// Resolve `records` and write the resolve checkpoint to `output`.
pub(super) fn resolve(
    ctx: &CommandContext,
    resolver: &Resolver,
    records: Vec<SourceRecord>,
    output: &Path,
) -> Result<(Vec<ResolvedRecord>, RunReport)> {
    pipeline::run_resolve_to(
        resolver,
        records,
        ctx.settings.workers,
        ctx.quiet || ctx.json,
        output,
    )
}
