//! Terminal output

use crate::config::CliConfig;
use console::{style, Term};

/// Prints run results to stdout
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    use_color: bool,
    quiet: bool,
}

impl Reporter {
    /// Create a reporter for the given CLI settings
    #[must_use]
    pub fn new(config: &CliConfig) -> Self {
        Self {
            term: Term::stdout(),
            use_color: config.color.should_color(),
            quiet: config.verbosity.is_quiet(),
        }
    }

    fn prefix(&self, colored: console::StyledObject<&'static str>, plain: &str) -> String {
        if self.use_color {
            colored.bold().to_string()
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix(style("✓").green(), "PASS");
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print a failure message, even in quiet mode
    pub fn failure(&self, message: &str) {
        let prefix = self.prefix(style("✗").red(), "FAIL");
        let _ = self.term.write_line(&format!("{prefix} {message}"));
    }

    /// Print raw text
    pub fn raw(&self, text: &str) {
        let _ = self.term.write_str(text);
    }
}
