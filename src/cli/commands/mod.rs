//! Command executors.
//!
//! Each command loads `Settings` once, builds the transports it needs and
//! hands the work to the pipeline. Reports go to stdout (text or `--json`),
//! everything else goes through `tracing` on stderr.

pub mod completions;
pub mod extract;
pub mod fields;
pub mod import;
pub mod resolve;
pub mod run;
pub mod whoami;

use crate::client::{HttpTransport, RetryPolicy, Transport, check_destination_login};
use crate::config::{self, CliOverrides, DestinationSettings, Settings, SourceSettings};
use crate::error::Result;
use crate::format::format_report;
use crate::model::RunReport;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs from the global flags.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub json: bool,
    pub quiet: bool,
}

impl CommandContext {
    /// Load and validate configuration for one command run.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the config file is unreadable or a value is invalid.
    pub fn load(config_path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let layer = config::load_config(config_path, overrides)?;
        Ok(Self {
            settings: Settings::from_layer(layer)?,
            json: overrides.json,
            quiet: overrides.quiet,
        })
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_delay(self.settings.rate_limit_delay)
    }

    /// Source settings plus a bearer-token transport.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a source key is missing.
    pub fn source_transport(&self) -> Result<(SourceSettings, Arc<dyn Transport>)> {
        let source = self.settings.source()?;
        let transport = HttpTransport::bearer(&source.token, self.settings.timeout)?;
        Ok((source, Arc::new(transport)))
    }

    /// Destination settings plus a basic-auth transport.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a destination key is missing.
    pub fn destination_transport(&self) -> Result<(DestinationSettings, Arc<dyn Transport>)> {
        let destination = self.settings.destination()?;
        let transport = HttpTransport::basic(
            &destination.email,
            &destination.token,
            self.settings.timeout,
        )?;
        Ok((destination, Arc::new(transport)))
    }

    /// Destination transport after a successful login check.
    ///
    /// # Errors
    ///
    /// Returns `Authentication` before any record is touched if the
    /// credentials are rejected.
    pub fn authenticated_destination(&self) -> Result<(DestinationSettings, Arc<dyn Transport>)> {
        let (destination, transport) = self.destination_transport()?;
        check_destination_login(transport.as_ref(), &destination.url, &self.retry_policy())?;
        Ok((destination, transport))
    }

    /// Print a phase report, then apply the failure-rate threshold.
    ///
    /// # Errors
    ///
    /// Returns `FailureThresholdExceeded` when too many records failed.
    pub fn finish_phase(&self, report: &RunReport) -> Result<()> {
        print_report(report, self.json)?;
        report.enforce_threshold(self.settings.max_failure_rate)
    }
}

/// Print a report as text or as one JSON document.
///
/// # Errors
///
/// Returns an error if the report cannot be serialized.
pub fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", format_report(report));
    }
    Ok(())
}

/// Default extract checkpoint for a run started now.
#[must_use]
pub fn default_extract_path(export_dir: &Path, field: &crate::model::FieldBinding) -> PathBuf {
    let stamp = crate::util::time::run_stamp(chrono::Local::now());
    crate::pipeline::extract_checkpoint_path(export_dir, field, &stamp)
}
