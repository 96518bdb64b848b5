//! Scenario runner

use crate::commands::{ConfigArgs, RunArgs};
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use storefront::{FakeStorefront, ScenarioOutcome, ShoppingCartScenario, StoreConfig, StoreDriver};

/// Load and validate the configuration a run would use
///
/// # Errors
///
/// Returns an error if the file, environment or flags are unusable.
pub fn resolve_config(cli: &CliConfig, args: &RunArgs) -> CliResult<StoreConfig> {
    let mut config = args.apply(StoreConfig::layered(args.config.as_deref())?);
    config.log_level = cli.effective_log_level(config.log_level);
    Ok(config.validated()?)
}

/// Render the resolved configuration as YAML
///
/// # Errors
///
/// Returns an error if the file or environment is unusable.
pub fn show_config(cli: &CliConfig, args: &ConfigArgs) -> CliResult<String> {
    let run_args = RunArgs {
        config: args.config.clone(),
        url: args.url.clone(),
        ..RunArgs::default()
    };
    Ok(resolve_config(cli, &run_args)?.to_yaml()?)
}

/// Run the shopping cart scenario to completion
///
/// # Errors
///
/// Returns the failing step's error, or a setup error.
pub fn run_scenario(cli: &CliConfig, args: &RunArgs) -> CliResult<ScenarioOutcome> {
    let config = resolve_config(cli, args)?;
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        if args.fake {
            run_with(FakeStorefront::new(), config).await
        } else {
            run_in_browser(config).await
        }
    })
}

async fn run_with<D: StoreDriver>(driver: D, config: StoreConfig) -> CliResult<ScenarioOutcome> {
    let mut scenario = ShoppingCartScenario::new(driver, config);
    let result = scenario.run().await;
    let mut page = scenario.into_page();
    let closed = page.close().await;
    let outcome = result?;
    closed?;
    Ok(outcome)
}

#[cfg(feature = "browser")]
async fn run_in_browser(config: StoreConfig) -> CliResult<ScenarioOutcome> {
    let driver = storefront::ChromiumDriver::launch(config.driver.clone()).await?;
    run_with(driver, config).await
}

#[cfg(not(feature = "browser"))]
async fn run_in_browser(_config: StoreConfig) -> CliResult<ScenarioOutcome> {
    Err(CliError::invalid_argument(
        "this build has no browser support; rebuild with --features browser or pass --fake",
    ))
}
