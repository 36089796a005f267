use asset_bridge::cli::commands::{self, CommandContext};
use asset_bridge::cli::{Cli, Commands};
use asset_bridge::config;
use asset_bridge::logging::init_logging;
use asset_bridge::{BridgeError, StructuredError};
use clap::Parser;
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = match &cli.command {
        Commands::Completions(args) => commands::completions::execute(args),
        command => {
            let overrides = build_cli_overrides(&cli);
            CommandContext::load(cli.config.as_deref(), &overrides)
                .and_then(|ctx| dispatch(command, &ctx))
        }
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

fn dispatch(command: &Commands, ctx: &CommandContext) -> asset_bridge::Result<()> {
    match command {
        Commands::Fields(args) => commands::fields::execute(args, ctx),
        Commands::Whoami => commands::whoami::execute(ctx),
        Commands::Extract(args) => commands::extract::execute(args, ctx),
        Commands::Resolve(args) => commands::resolve::execute(args, ctx),
        Commands::Import(args) => commands::import::execute(args, ctx),
        Commands::Run(args) => commands::run::execute(args, ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs human-readable error with optional color.
fn handle_error(err: &BridgeError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}

fn build_cli_overrides(cli: &Cli) -> config::CliOverrides {
    config::CliOverrides {
        page_size: cli.page_size,
        workers: cli.workers,
        timeout_secs: cli.timeout_secs,
        rate_limit_delay_secs: cli.rate_limit_delay_secs,
        max_failure_rate: cli.max_failure_rate,
        export_dir: cli.export_dir.clone(),
        quiet: cli.quiet,
        json: cli.json,
    }
}
