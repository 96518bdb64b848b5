//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storefront::{LogLevel, StoreConfig};

/// Storefront E2E: run the shopping cart scenario against the demo store
#[derive(Parser, Debug)]
#[command(name = "storefront-e2e")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only errors are logged)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Minimum log level, overriding -v/-q and the config file
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the shopping cart scenario
    Run(RunArgs),

    /// Show the resolved configuration as YAML
    Config(ConfigArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storefront URL
    #[arg(long)]
    pub url: Option<String>,

    /// Run against the built-in in-memory storefront instead of Chromium
    #[arg(long)]
    pub fake: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Path to the Chromium binary
    #[arg(long)]
    pub chromium_path: Option<String>,

    /// Disable the Chromium sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Timeout for element and settle waits, in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

impl RunArgs {
    /// Apply command-line overrides on top of a loaded config
    #[must_use]
    pub fn apply(&self, mut config: StoreConfig) -> StoreConfig {
        if let Some(ref url) = self.url {
            config.base_url.clone_from(url);
        }
        if self.headed {
            config.driver.headless = false;
        }
        if let Some(ref path) = self.chromium_path {
            config.driver.chromium_path = Some(path.clone());
        }
        if self.no_sandbox {
            config.driver.sandbox = false;
        }
        if let Some(ms) = self.timeout_ms {
            config.wait = config.wait.with_timeout(ms);
        }
        config
    }
}

/// Arguments for the config command
#[derive(Parser, Debug, Default)]
pub struct ConfigArgs {
    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Storefront URL
    #[arg(long)]
    pub url: Option<String>,
}

/// Log level argument
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevelArg {
    /// Everything
    Debug,
    /// Step progress
    Info,
    /// Warnings and errors
    Warn,
    /// Errors only
    Error,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Debug => Self::Debug,
            LogLevelArg::Info => Self::Info,
            LogLevelArg::Warn => Self::Warn,
            LogLevelArg::Error => Self::Error,
        }
    }
}

/// Color output argument
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
