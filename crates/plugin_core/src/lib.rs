//! Contract primitives for single-shot JSON plugins.
//!
//! A plugin receives one JSON object as its only command-line argument,
//! validates it against a [`params::ParamSchema`], does its work and prints a
//! single `{"plugin_results": {...}}` line. This crate owns that contract and
//! intentionally excludes AWS SDK concerns; see `plugin_s3` for transfers.

pub mod error;
pub mod locator;
pub mod logging;
pub mod params;
pub mod results;

pub use error::{PluginError, SchemaViolation};
pub use locator::StorageLocator;
pub use params::{parse_env_args, parse_input, parse_os_args, ParamSchema, ParsedParams};
pub use results::{print_results, render_results, write_results, RESULTS_KEY};
