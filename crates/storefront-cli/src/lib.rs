//! Storefront E2E CLI Library
//!
//! Command-line interface for running the shopping cart scenario.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{Cli, ColorArg, Commands, ConfigArgs, LogLevelArg, RunArgs};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::Reporter;
pub use runner::{resolve_config, run_scenario, show_config};
