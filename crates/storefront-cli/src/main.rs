//! Storefront E2E CLI
//!
//! Usage:
//!   storefront-e2e run --fake       # In-memory storefront
//!   storefront-e2e run              # Chromium (needs --features browser)
//!   storefront-e2e config           # Show resolved configuration

use clap::Parser;
use std::process::ExitCode;
use storefront_cli::{
    run_scenario, show_config, Cli, CliConfig, CliResult, Commands, Reporter, Verbosity,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_level(cli.log_level.map(Into::into));
    let reporter = Reporter::new(&config);

    match cli.command {
        Commands::Run(args) => match run_scenario(&config, &args) {
            Ok(outcome) => {
                reporter.success(&format!(
                    "shopping cart scenario passed ({} steps, badge {}, subtotal {})",
                    outcome.steps_passed, outcome.badge_count, outcome.subtotal
                ));
                Ok(())
            }
            Err(e) => {
                reporter.failure("shopping cart scenario failed");
                Err(e)
            }
        },
        Commands::Config(args) => {
            reporter.raw(&show_config(&config, &args)?);
            Ok(())
        }
    }
}
