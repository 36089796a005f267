use super::{CommandContext, default_extract_path};
use crate::cli::ExtractArgs;
use crate::client::{fetch_field_catalog, find_field};
use crate::error::Result;
use crate::model::{FieldBinding, RunReport, SourceRecord};
use crate::pipeline;
use crate::source::SourceReader;
use std::path::{Path, PathBuf};
use tracing::info;

/// Execute the extract command.
///
/// # Errors
///
/// Returns an error if the source field is unknown, any search page fails,
/// or the checkpoint cannot be written.
pub fn execute(args: &ExtractArgs, ctx: &CommandContext) -> Result<()> {
    let (_, _, report) = extract(ctx, &args.jql, &args.field, args.output.as_deref())?;
    ctx.finish_phase(&report)
}

/// Look up the source field, read every matching issue and write the
/// extract checkpoint. Returns the checkpoint path and the records.
pub(super) fn extract(
    ctx: &CommandContext,
    jql: &str,
    field_name: &str,
    output: Option<&Path>,
) -> Result<(PathBuf, Vec<SourceRecord>, RunReport)> {
    let (source, transport) = ctx.source_transport()?;
    let retry = ctx.retry_policy();

    let catalog = fetch_field_catalog(transport.as_ref(), &source.url, &retry)?;
    let field: FieldBinding = find_field(&catalog, field_name, "source")?;

    let path = output.map_or_else(
        || default_extract_path(&ctx.settings.export_dir, &field),
        Path::to_path_buf,
    );
    info!(path = %path.display(), "Extract checkpoint");

    let reader = SourceReader::new(transport, source.url)
        .page_size(ctx.settings.page_size)
        .retry(retry)
        .quiet(ctx.quiet || ctx.json);
    let (records, report) = pipeline::run_extract(&reader, jql, &field, &path)?;
    Ok((path, records, report))
}
