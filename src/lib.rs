//! `asset_bridge` - moves the asset custom-field link from a self-hosted
//! tracker to its cloud counterpart.
//!
//! The migration runs in three phases, each leaving a CSV checkpoint an
//! operator can inspect before continuing:
//!
//! 1. **extract** - page through a source search and pull the referenced
//!    asset key out of each issue's asset field
//! 2. **resolve** - find the destination asset object whose
//!    "Original Object Key" matches, on a pool of worker threads
//! 3. **import** - write the destination object's global id into the
//!    destination issue's asset field

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod import;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod resolve;
pub mod source;
pub mod util;

pub use error::{BridgeError, ErrorCode, Result, StructuredError};
