//! Progress indicator utilities for long-running phases.
//!
//! Provides:
//! - Determinate progress bars for known-count phases
//! - Conditional display based on terminal detection
//! - A tracker that pairs the bar with `RunProgress` log lines

use crate::model::RunProgress;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};
use tracing::debug;

/// Check if we should show progress indicators.
///
/// Progress is shown only if stderr is an interactive terminal.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a determinate progress bar for operations with known total count.
///
/// # Panics
/// Panics if the progress bar template string is invalid.
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .expect("valid template")
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Progress bar plus the phase's `RunProgress` counters.
///
/// Every `inc` logs the processed/percentage/elapsed line at debug level, so
/// a log file carries the same information as the terminal bar.
pub struct ProgressTracker {
    bar: ProgressBar,
    progress: RunProgress,
}

impl ProgressTracker {
    /// Create a new progress tracker with a determinate total.
    #[must_use]
    pub fn new(total: usize, message: &str, quiet: bool) -> Self {
        let showing = !quiet && should_show_progress();
        Self {
            bar: create_progress_bar(total as u64, message, showing),
            progress: RunProgress::new(total),
        }
    }

    /// Replace the total (the source tracker reports it with each page).
    pub fn set_total(&mut self, total: usize) {
        self.progress.set_total(total);
        self.bar.set_length(total as u64);
    }

    /// Record one processed record.
    pub fn inc(&mut self) {
        self.progress.advance();
        self.bar.inc(1);
        debug!("{}", self.progress.summary());
    }

    /// Finish and clear the progress bar.
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}
