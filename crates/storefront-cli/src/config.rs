//! CLI configuration

use serde::{Deserialize, Serialize};
use storefront::LogLevel;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// Map `-q` and the `-v` count to a verbosity
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Log level implied by this verbosity, if it implies one
    #[must_use]
    pub const fn log_level(self) -> Option<LogLevel> {
        match self {
            Self::Quiet => Some(LogLevel::Error),
            Self::Normal => None,
            Self::Verbose | Self::Debug => Some(LogLevel::Debug),
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }
}

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Explicit `--log-level`
    pub log_level: Option<LogLevel>,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set an explicit log level
    #[must_use]
    pub const fn with_log_level(mut self, level: Option<LogLevel>) -> Self {
        self.log_level = level;
        self
    }

    /// Resolve the scenario log level: `--log-level`, then `-v`/`-q`, then
    /// whatever the loaded config says
    #[must_use]
    pub fn effective_log_level(&self, configured: LogLevel) -> LogLevel {
        self.log_level
            .or_else(|| self.verbosity.log_level())
            .unwrap_or(configured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_flags() {
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 3), Verbosity::Debug);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        assert!(Verbosity::Quiet.is_quiet());
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorChoice::Always.should_color());
        assert!(!ColorChoice::Never.should_color());
    }

    #[test]
    fn test_log_level_precedence() {
        let config = CliConfig::new();
        assert_eq!(config.effective_log_level(LogLevel::Warn), LogLevel::Warn);

        let verbose = CliConfig::new().with_verbosity(Verbosity::Verbose);
        assert_eq!(verbose.effective_log_level(LogLevel::Warn), LogLevel::Debug);

        let explicit = verbose.with_log_level(Some(LogLevel::Error));
        assert_eq!(explicit.effective_log_level(LogLevel::Info), LogLevel::Error);
    }
}
