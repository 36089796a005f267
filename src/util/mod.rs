//! Shared utilities for `asset_bridge`.
//!
//! - Elapsed-time and run timestamp formatting
//! - Progress indicators (for long-running phases)

pub mod progress;
pub mod time;
