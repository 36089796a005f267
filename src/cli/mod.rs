//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;

/// Migrate asset field links from a self-hosted tracker to the cloud
#[derive(Parser, Debug)]
#[command(name = "asset-bridge", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./asset-bridge.yaml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Output reports and errors as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no progress bars, errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write log events to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Concurrent lookups during resolve
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// Fraction of failed records tolerated before a phase exits non-zero
    #[arg(long, global = true)]
    pub max_failure_rate: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Wait before retrying a rate-limited request, in seconds
    #[arg(long, global = true)]
    pub rate_limit_delay_secs: Option<u64>,

    /// Issues requested per search page
    #[arg(long, global = true)]
    pub page_size: Option<usize>,

    /// Directory for checkpoint files
    #[arg(long, global = true)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List a tracker's field catalog
    Fields(FieldsArgs),

    /// Check the destination credentials
    Whoami,

    /// Read source issues and write the extract checkpoint
    Extract(ExtractArgs),

    /// Look up destination asset objects for an extract checkpoint
    Resolve(ResolveArgs),

    /// Write resolved asset objects onto destination issues
    Import(ImportArgs),

    /// Run extract, resolve and import back to back
    Run(RunArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Which tracker a command talks to.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum Side {
    /// Self-hosted tracker being migrated from
    Source,
    /// Cloud tracker being migrated to
    Destination,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Destination => "destination",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct FieldsArgs {
    /// Tracker to list
    #[arg(long, value_enum, default_value_t = Side::Source)]
    pub side: Side,

    /// Only show fields whose name or id contains this text (case-insensitive)
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Source search filter (JQL)
    #[arg(long)]
    pub jql: String,

    /// Source asset field, by display name or id
    #[arg(long)]
    pub field: String,

    /// Checkpoint path (default: {export-dir}/{name}_{id}_{timestamp}.csv)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Extract checkpoint to read
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Checkpoint path (default: input name with a `_cloud` suffix)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    /// Resolve checkpoint to read
    #[arg(long, short = 'i')]
    pub input: PathBuf,

    /// Destination asset field, by display name or id
    #[arg(long)]
    pub field: String,

    /// Log the updates without sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Source search filter (JQL)
    #[arg(long)]
    pub jql: String,

    /// Source asset field, by display name or id
    #[arg(long)]
    pub source_field: String,

    /// Destination asset field, by display name or id
    #[arg(long)]
    pub destination_field: String,

    /// Log the updates without sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output directory (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}
