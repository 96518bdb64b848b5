//! Shopping cart scenario, end to end.
//!
//! Runs against the in-memory storefront by default. The live test needs
//! `--features browser`, a Chromium binary and network access:
//!
//! ```text
//! cargo test -p storefront-e2e --features browser -- --ignored
//! ```

use storefront::prelude::*;
use storefront::{STEP_COUNT, SCENARIO_PRODUCTS};

fn fast_config() -> StoreConfig {
    StoreConfig::new()
        .with_base_url("https://store.test/")
        .with_wait(WaitOptions::new().with_timeout(1_000).with_poll_interval(10))
        .with_log_level(LogLevel::Warn)
}

#[tokio::test(start_paused = true)]
async fn scenario_passes_against_fake_storefront() {
    let mut scenario = ShoppingCartScenario::new(FakeStorefront::new(), fast_config());
    let outcome = scenario.run().await.unwrap();

    assert_eq!(outcome.badge_count, 4);
    assert_eq!(outcome.subtotal, Money::from_cents(9590));
    assert_eq!(outcome.subtotal.to_string(), "$95.90");
    assert_eq!(outcome.lines_removed, SCENARIO_PRODUCTS.len());
    assert_eq!(outcome.steps_passed, STEP_COUNT);
}

#[tokio::test(start_paused = true)]
async fn scenario_tolerates_slow_rendering() {
    let fake = FakeStorefront::new().with_render_lag(4);
    let mut scenario = ShoppingCartScenario::new(fake, fast_config());
    let outcome = scenario.run().await.unwrap();
    assert_eq!(outcome.badge_count, 4);

    let page = scenario.into_page();
    assert!(page.is_cart_empty().await.is_ok());
    assert!(page.driver().cart_lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn page_object_reports_empty_cart_totals() {
    let mut page = StorePage::new(FakeStorefront::new(), fast_config());
    page.open().await.unwrap();
    page.add_products_to_cart(SCENARIO_PRODUCTS).await.unwrap();
    page.empty_cart_by_remove_button().await.unwrap();

    page.verify_cart_is_empty().await.unwrap();
    assert_eq!(page.cart_subtotal().await.unwrap(), Money::ZERO);
    assert_eq!(page.total_cart_items_count().await.unwrap(), 0);
    assert_eq!(page.badge_count().await.unwrap(), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_url_fails_first_step() {
    let config = fast_config().with_base_url("file:///nowhere");
    let mut scenario = ShoppingCartScenario::new(FakeStorefront::new(), config);
    let err = scenario.run().await.unwrap_err();
    assert!(matches!(err, StoreError::NavigationError { .. }));
}

#[cfg(feature = "browser")]
#[tokio::test]
#[ignore = "requires Chromium and network access"]
async fn scenario_passes_against_live_storefront() {
    let config = StoreConfig::load(None).unwrap();
    let driver = ChromiumDriver::launch(config.driver.clone()).await.unwrap();
    let mut scenario = ShoppingCartScenario::new(driver, config);

    let result = scenario.run().await;
    let mut page = scenario.into_page();
    page.close().await.unwrap();

    let outcome = result.unwrap();
    assert_eq!(outcome.badge_count, 4);
    assert_eq!(outcome.subtotal, Money::from_cents(9590));
}
