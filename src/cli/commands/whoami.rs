use super::CommandContext;
use crate::client::check_destination_login;
use crate::error::Result;
use serde::Serialize;

#[derive(Serialize)]
struct WhoamiOutput<'a> {
    site: &'a str,
    display_name: String,
}

/// Execute the whoami command.
///
/// # Errors
///
/// Returns `Authentication` if the destination rejects the credentials.
pub fn execute(ctx: &CommandContext) -> Result<()> {
    let (destination, transport) = ctx.destination_transport()?;
    let display_name =
        check_destination_login(transport.as_ref(), &destination.url, &ctx.retry_policy())?;

    if ctx.json {
        let output = WhoamiOutput {
            site: &destination.url,
            display_name,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Logged in to {} as {display_name}", destination.url);
    }
    Ok(())
}
