use super::CommandContext;
use crate::cli::RunArgs;
use crate::error::Result;
use crate::pipeline::resolve_checkpoint_path;
use tracing::info;

/// Execute the run command: extract, resolve and import back to back.
///
/// The destination login and the destination field are checked before the
/// source is read. Each phase prints its report and applies the failure
/// threshold before the next one starts, so a failing phase leaves its
/// checkpoint behind for the individual commands to pick up.
///
/// # Errors
///
/// Returns the first phase error or threshold violation.
pub fn execute(args: &RunArgs, ctx: &CommandContext) -> Result<()> {
    let (destination, transport) = ctx.authenticated_destination()?;
    let target = super::import::target(
        ctx,
        &destination,
        transport.clone(),
        &args.destination_field,
        args.dry_run,
    )?;
    let resolver = super::resolve::resolver(ctx, &destination, transport);

    let (extract_path, records, report) =
        super::extract::extract(ctx, &args.jql, &args.source_field, None)?;
    ctx.finish_phase(&report)?;

    let resolve_path = resolve_checkpoint_path(&extract_path);
    let (resolved, report) = super::resolve::resolve(ctx, &resolver, records, &resolve_path)?;
    ctx.finish_phase(&report)?;

    let report = super::import::apply(ctx, &target, &resolved);
    ctx.finish_phase(&report)?;

    info!(
        extract = %extract_path.display(),
        resolve = %resolve_path.display(),
        "Migration complete"
    );
    Ok(())
}
