//! The shopping cart scenario.
//!
//! A fixed, linear script over [`StorePage`]: filter the grid, fill the
//! cart, check its totals, then empty it again. Every step logs when it
//! starts and when it passes; a failing step logs the error at ERROR and
//! the error is returned unchanged, ending the run.

use crate::config::StoreConfig;
use crate::driver::StoreDriver;
use crate::logging::{error_chain, LogContext};
use crate::money::Money;
use crate::page::StorePage;
use crate::result::{StoreError, StoreResult};
use crate::size::SizeFilter;
use std::future::Future;

/// Size filters toggled on, checked, then toggled off again
pub const SCENARIO_FILTERS: [SizeFilter; 2] = [SizeFilter::XS, SizeFilter::ML];

/// Products added to the cart, in order
pub const SCENARIO_PRODUCTS: [&str; 2] = ["Blue T-Shirt", "Black T-shirt with white stripes"];

/// Extra `+` clicks on the first product
pub const EXTRA_QUANTITY: u32 = 2;

/// Number of steps in a full run
pub const STEP_COUNT: usize = 14;

/// What a completed run observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioOutcome {
    /// Badge count after raising the quantity
    pub badge_count: u32,
    /// Subtotal after raising the quantity
    pub subtotal: Money,
    /// Lines removed while emptying the cart
    pub lines_removed: usize,
    /// Steps that passed
    pub steps_passed: usize,
}

#[derive(Debug, Default)]
struct StepLog {
    passed: usize,
}

impl StepLog {
    async fn run<T, F>(&mut self, name: &str, step: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let number = self.passed + 1;
        tracing::info!(step = number, "{name}: started");
        match step.await {
            Ok(value) => {
                self.passed += 1;
                tracing::info!(step = number, "{name}: passed");
                Ok(value)
            }
            Err(e) => {
                tracing::error!(step = number, error = %e, detail = %error_chain(&e), "{name}: failed");
                Err(e)
            }
        }
    }
}

/// Shopping cart scenario over any [`StoreDriver`]
#[derive(Debug)]
pub struct ShoppingCartScenario<D> {
    page: StorePage<D>,
    log: LogContext,
}

impl<D: StoreDriver> ShoppingCartScenario<D> {
    /// Build the scenario. Logging follows `config.log_level` unless
    /// `RUST_LOG` says otherwise.
    #[must_use]
    pub fn new(driver: D, config: StoreConfig) -> Self {
        let log = LogContext::from_env_or(config.log_level);
        Self {
            page: StorePage::new(driver, config),
            log,
        }
    }

    /// Replace the logging context
    #[must_use]
    pub fn with_log_context(mut self, log: LogContext) -> Self {
        self.log = log;
        self
    }

    /// The page object
    #[must_use]
    pub const fn page(&self) -> &StorePage<D> {
        &self.page
    }

    /// Take the page object back, e.g. to close the driver
    #[must_use]
    pub fn into_page(self) -> StorePage<D> {
        self.page
    }

    /// Run every step in order, stopping at the first failure
    ///
    /// # Errors
    ///
    /// Returns the failing step's error unchanged.
    pub async fn run(&mut self) -> StoreResult<ScenarioOutcome> {
        let log = self.log.clone();
        log.scope(self.run_steps()).await
    }

    async fn run_steps(&mut self) -> StoreResult<ScenarioOutcome> {
        let mut steps = StepLog::default();
        let [first, _] = SCENARIO_PRODUCTS;

        steps.run("open storefront", self.page.open()).await?;

        let page = &self.page;
        steps
            .run("toggle size filters on", async {
                for size in SCENARIO_FILTERS {
                    page.click_size_filter(size).await?;
                }
                Ok(())
            })
            .await?;
        steps
            .run("verify product count", page.verify_product_count())
            .await?;
        steps
            .run("toggle size filters off", async {
                for size in SCENARIO_FILTERS {
                    page.click_size_filter(size).await?;
                }
                Ok(())
            })
            .await?;
        steps
            .run("add products and close cart", async {
                page.add_products_to_cart(SCENARIO_PRODUCTS).await?;
                page.close_cart().await
            })
            .await?;
        steps.run("open cart", page.open_cart()).await?;
        steps
            .run("verify line item count", async {
                let lines = page.product_item_count().await?;
                if lines != SCENARIO_PRODUCTS.len() {
                    return Err(StoreError::assertion(format!(
                        "expected {} line items, found {lines}",
                        SCENARIO_PRODUCTS.len()
                    )));
                }
                Ok(())
            })
            .await?;
        steps
            .run(
                "increase product quantity",
                page.increase_product_quantity(first, EXTRA_QUANTITY),
            )
            .await?;
        let badge_count = steps
            .run("verify total cart items", page.verify_total_cart_items_count())
            .await?;
        let subtotal = steps
            .run("verify subtotal", page.verify_subtotal_matches_item_costs())
            .await?;
        let lines_removed = steps
            .run("empty cart", page.empty_cart_by_remove_button())
            .await?;
        steps
            .run("verify cart is empty", page.verify_cart_is_empty())
            .await?;
        steps
            .run("verify subtotal is zero", async {
                let subtotal = page.cart_subtotal().await?;
                if subtotal != Money::ZERO {
                    return Err(StoreError::assertion(format!(
                        "empty cart shows subtotal {subtotal}"
                    )));
                }
                Ok(())
            })
            .await?;
        steps.run("close cart", page.close_cart()).await?;

        tracing::info!(%subtotal, badge_count, "scenario passed");
        Ok(ScenarioOutcome {
            badge_count,
            subtotal,
            lines_removed,
            steps_passed: steps.passed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{default_catalog, FakeStorefront};
    use crate::logging::test_support::SharedBuffer;
    use crate::logging::LogLevel;
    use crate::wait::WaitOptions;

    fn quick_config() -> StoreConfig {
        StoreConfig::new()
            .with_base_url("https://store.test/")
            .with_wait(WaitOptions::new().with_timeout(500).with_poll_interval(10))
    }

    fn scenario(fake: FakeStorefront, buffer: &SharedBuffer) -> ShoppingCartScenario<FakeStorefront> {
        ShoppingCartScenario::new(fake, quick_config())
            .with_log_context(LogContext::with_writer(LogLevel::Info, buffer.clone()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_passes() {
        let buffer = SharedBuffer::default();
        let mut run = scenario(FakeStorefront::new().with_render_lag(1), &buffer);

        let outcome = run.run().await.unwrap();
        assert_eq!(
            outcome,
            ScenarioOutcome {
                badge_count: 4,
                subtotal: Money::from_cents(9590),
                lines_removed: 2,
                steps_passed: STEP_COUNT,
            }
        );

        let fake = run.into_page().into_driver();
        assert!(fake.cart_lines().is_empty());
        assert!(!fake.is_cart_open());
        assert!(fake.active_filters().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_steps_are_logged() {
        let buffer = SharedBuffer::default();
        scenario(FakeStorefront::new(), &buffer).run().await.unwrap();

        let out = buffer.contents();
        assert_eq!(out.matches(": started").count(), STEP_COUNT);
        assert_eq!(out.matches(": passed").count(), STEP_COUNT);
        assert!(out.contains("verify subtotal: passed"));
        assert!(out.contains("scenario passed"));
        assert!(!out.contains("ERROR"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_logged_and_returned() {
        let catalog = default_catalog()
            .into_iter()
            .filter(|p| p.name != SCENARIO_PRODUCTS[1])
            .collect();
        let buffer = SharedBuffer::default();
        let mut run = scenario(FakeStorefront::with_catalog(catalog), &buffer);

        let err = run.run().await.unwrap_err();
        assert!(matches!(err, StoreError::ElementNotFound { .. }));

        let out = buffer.contents();
        assert!(out.contains("ERROR"));
        assert!(out.contains("add products and close cart: failed"));
        assert!(!out.contains("open cart: started"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_level_suppresses_progress() {
        let buffer = SharedBuffer::default();
        let mut run = ShoppingCartScenario::new(FakeStorefront::new(), quick_config())
            .with_log_context(LogContext::with_writer(LogLevel::Warn, buffer.clone()));
        run.run().await.unwrap();
        assert!(buffer.contents().is_empty());
    }
}
