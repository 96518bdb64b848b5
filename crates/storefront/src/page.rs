//! Store Page Object
//!
//! [`StorePage`] is the page object for the storefront: product grid, size
//! filters and the cart overlay. It keeps no copy of cart state. Every
//! readout re-queries the driver, so assertions always compare what the page
//! shows right now.
//!
//! ```text
//! ┌──────────────────────┐   Locator    ┌──────────────────────┐
//! │  StorePage           │ ───────────► │  StoreDriver         │
//! │  - StoreLocators     │              │  count / click /     │
//! │  - auto-wait         │ ◄─────────── │  inner_text / ...    │
//! │  - settle waits      │   text, n    └──────────────────────┘
//! └──────────────────────┘
//! ```
//!
//! Interactions auto-wait for their target to resolve to exactly one
//! element. Clicks that change the cart wait until the page reflects the
//! change (quantity readout, line item appearing or disappearing) instead of
//! sleeping for a fixed time.

use crate::config::StoreConfig;
use crate::driver::{expect_single, StoreDriver};
use crate::locator::{Locator, TextMatch};
use crate::money::Money;
use crate::readout;
use crate::result::{StoreError, StoreResult};
use crate::size::SizeFilter;
use crate::wait::{wait_for, wait_until, WaitOptions};
use std::time::Duration;

// =============================================================================
// LOCATORS
// =============================================================================

/// CSS for the remove control inside a cart line
const REMOVE_BUTTON: &str = r#"button[title="remove product from cart"]"#;
/// CSS for the unit price inside a cart line
const ITEM_PRICE: &str = "div.sc-11uohgb-4 p";

/// Base locators for the storefront
///
/// The live application exposes only generated class names for most
/// controls; they are kept here and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocators {
    /// Button that opens the cart (only present while it is closed)
    pub cart_toggle: Locator,
    /// `X` button that closes the cart
    pub close_cart: Locator,
    /// Products container
    pub product_grid: Locator,
    /// "N Product(s) found" status text
    pub products_found: Locator,
    /// Every cart line item
    pub cart_items: Locator,
    /// Quantity badge on the cart icon
    pub badge: Locator,
    /// Subtotal amount
    pub subtotal: Locator,
    /// Message shown by an empty, open cart
    pub empty_cart_message: Locator,
}

impl StoreLocators {
    /// Build the locators, auto-waiting with `wait`
    #[must_use]
    pub fn new(wait: &WaitOptions) -> Self {
        let tune = |locator: Locator| tuned(locator, wait);
        Self {
            cart_toggle: tune(
                Locator::css("button").has(Locator::css(r#"div[class="sc-1h98xa9-2 fGgnoG"]"#)),
            ),
            close_cart: tune(Locator::role("button", Some(TextMatch::exact("X")))),
            product_grid: tune(Locator::css("div.sc-uhudcz-0.iZZGui")),
            products_found: tune(Locator::text(TextMatch::pattern(r"Product\(s\) found"))),
            cart_items: tune(Locator::css("div.sc-11uohgb-0.hDmOrM")),
            badge: tune(Locator::css("div.sc-1h98xa9-3.VLMSP")),
            subtotal: tune(Locator::css("div.sc-1h98xa9-8.bciIxg p.sc-1h98xa9-9.jzywDV")),
            empty_cart_message: tune(Locator::css("p.sc-7th5t8-1.hqDkK")),
        }
    }
}

impl Default for StoreLocators {
    fn default() -> Self {
        Self::new(&WaitOptions::default())
    }
}

fn tuned(locator: Locator, wait: &WaitOptions) -> Locator {
    locator
        .with_timeout(wait.timeout())
        .with_poll_interval(wait.poll_interval())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// CART LINE SNAPSHOT
// =============================================================================

/// What one cart line showed when it was read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Quantity
    pub quantity: u32,
}

impl CartLine {
    /// Price times quantity
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the readouts multiply past the representable range.
    pub fn cost(&self) -> StoreResult<Money> {
        self.price.checked_mul(self.quantity).ok_or_else(|| {
            StoreError::parse("cart line cost", format!("{} x {}", self.price, self.quantity))
        })
    }
}

// =============================================================================
// PAGE OBJECT
// =============================================================================

/// Page object for the storefront
#[derive(Debug)]
pub struct StorePage<D> {
    driver: D,
    config: StoreConfig,
    locators: StoreLocators,
}

impl<D: StoreDriver> StorePage<D> {
    /// Wrap a driver
    #[must_use]
    pub fn new(driver: D, config: StoreConfig) -> Self {
        let locators = StoreLocators::new(&config.wait);
        Self {
            driver,
            config,
            locators,
        }
    }

    /// The underlying driver
    #[must_use]
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The underlying driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Base locators
    #[must_use]
    pub const fn locators(&self) -> &StoreLocators {
        &self.locators
    }

    /// Navigate to the configured storefront URL
    ///
    /// # Errors
    ///
    /// Returns the driver's navigation error.
    pub async fn open(&mut self) -> StoreResult<()> {
        tracing::info!(url = %self.config.base_url, "opening storefront");
        self.driver.navigate(&self.config.base_url).await
    }

    /// Release the driver
    ///
    /// # Errors
    ///
    /// Returns the driver's error if shutdown fails.
    pub async fn close(&mut self) -> StoreResult<()> {
        self.driver.close().await
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    fn tuned(&self, locator: Locator) -> Locator {
        tuned(locator, &self.config.wait)
    }

    /// Add-to-cart control of the grid card named exactly `name`
    #[must_use]
    pub fn add_to_cart_button(&self, name: &str) -> Locator {
        self.locators
            .product_grid
            .clone()
            .locator(Locator::css(r#"div[tabindex="1"]"#))
            .has(Locator::text(TextMatch::exact(name)))
            .locator(Locator::role(
                "button",
                Some(TextMatch::pattern("add to cart").ignore_case()),
            ))
    }

    /// Cart line item for the product named exactly `name`
    #[must_use]
    pub fn line_item(&self, name: &str) -> Locator {
        self.locators
            .cart_items
            .clone()
            .has(Locator::text(TextMatch::exact(name)))
    }

    /// `+` control of a cart line
    #[must_use]
    pub fn plus_button(&self, name: &str) -> Locator {
        self.line_item(name)
            .locator(Locator::css("button").has_text("+"))
    }

    /// `-` control of a cart line
    #[must_use]
    pub fn minus_button(&self, name: &str) -> Locator {
        self.line_item(name)
            .locator(Locator::css("button").has_text("-"))
    }

    /// Remove control of a cart line
    #[must_use]
    pub fn remove_button(&self, name: &str) -> Locator {
        self.line_item(name).locator(Locator::css(REMOVE_BUTTON))
    }

    /// Checkbox label for a size filter
    #[must_use]
    pub fn filter_size(&self, size: SizeFilter) -> Locator {
        self.tuned(Locator::css("label").has(Locator::css(format!(
            r#"input[data-testid="checkbox"][value="{}"]"#,
            size.as_str()
        ))))
    }

    // -------------------------------------------------------------------------
    // Auto-waiting primitives
    // -------------------------------------------------------------------------

    /// Wait until `locator` matches at least one element, then require
    /// exactly one.
    async fn resolve_one(&self, locator: &Locator) -> StoreResult<()> {
        let options = WaitOptions::new()
            .with_timeout(millis(locator.options().timeout))
            .with_poll_interval(millis(locator.options().poll_interval));
        let driver = &self.driver;
        let description = locator.to_string();

        let found = wait_for(&options, &description, || async move {
            let count = driver.count(locator).await?;
            Ok((count > 0).then_some(count))
        })
        .await;

        match found {
            Ok(found) => expect_single(locator, found.value),
            Err(StoreError::Timeout { ms, .. }) => Err(StoreError::ElementNotFound {
                locator: description,
                timeout_ms: ms,
            }),
            Err(e) => Err(e),
        }
    }

    async fn click(&self, locator: &Locator) -> StoreResult<()> {
        self.resolve_one(locator).await?;
        tracing::debug!(%locator, "click");
        self.driver.click(locator).await
    }

    async fn text_of(&self, locator: &Locator) -> StoreResult<String> {
        self.resolve_one(locator).await?;
        self.driver.inner_text(locator).await
    }

    async fn wait_for_count(&self, locator: &Locator, expected: usize, what: &str) -> StoreResult<()> {
        let driver = &self.driver;
        wait_until(&self.config.wait, what, || async move {
            Ok(driver.count(locator).await? == expected)
        })
        .await?;
        Ok(())
    }

    async fn wait_for_quantity(&self, item: &Locator, expected: u32) -> StoreResult<()> {
        let description = format!("quantity {expected} on {item}");
        let driver = &self.driver;
        let quantity = item.clone().locator(quantity_readout());
        wait_until(&self.config.wait, &description, || {
            let quantity = &quantity;
            async move {
                if driver.count(quantity).await? != 1 {
                    return Ok(false);
                }
                let text = driver.inner_text(quantity).await?;
                Ok(readout::parse_quantity(&text)? == expected)
            }
        })
        .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Filters and grid
    // -------------------------------------------------------------------------

    /// Toggle one size filter. Clicking twice restores the original state.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkbox cannot be resolved or clicked.
    pub async fn click_size_filter(&self, size: SizeFilter) -> StoreResult<()> {
        tracing::debug!(%size, "toggling size filter");
        self.click(&self.filter_size(size)).await
    }

    /// Number from the "N Product(s) found" readout
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the readout does not start with a number.
    pub async fn products_found_count(&self) -> StoreResult<usize> {
        let text = self.text_of(&self.locators.products_found).await?;
        readout::parse_products_found(&text)
    }

    /// Number of cards rendered in the grid
    ///
    /// # Errors
    ///
    /// Returns an error if the grid never renders.
    pub async fn product_count(&self) -> StoreResult<usize> {
        self.resolve_one(&self.locators.product_grid).await?;
        self.driver
            .count(&self.locators.product_grid.clone().children())
            .await
    }

    async fn product_counts(&self) -> StoreResult<(usize, usize)> {
        Ok((self.products_found_count().await?, self.product_count().await?))
    }

    /// Assert that the "found" readout agrees with the grid.
    ///
    /// The grid may still be re-rendering after a filter click, so both
    /// readouts are polled until they agree or the settle timeout expires.
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` with the last observed values on timeout.
    pub async fn verify_product_count(&self) -> StoreResult<()> {
        let agreed = wait_for(&self.config.wait, "products found == grid size", || async move {
            let (found, shown) = self.product_counts().await?;
            Ok((found == shown).then_some(found))
        })
        .await;

        match agreed {
            Ok(result) => {
                tracing::debug!(count = result.value, polls = result.polls, "product count verified");
                Ok(())
            }
            Err(StoreError::Timeout { ms, .. }) => {
                let (found, shown) = self.product_counts().await?;
                Err(StoreError::assertion(format!(
                    "readout says {found} product(s) found but the grid shows {shown} after {ms}ms"
                )))
            }
            Err(e) => Err(e),
        }
    }

    // -------------------------------------------------------------------------
    // Cart open / close / add
    // -------------------------------------------------------------------------

    /// Click one product's add-to-cart control and wait for its line item.
    ///
    /// The cart opens as a side effect and stays open.
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if no card is named `name`.
    pub async fn add_product_to_cart(&self, name: &str) -> StoreResult<()> {
        tracing::debug!(product = name, "adding to cart");
        self.click(&self.add_to_cart_button(name)).await?;
        self.wait_for_count(&self.line_item(name), 1, &format!("{name:?} in cart"))
            .await
    }

    /// Add each product in order. The cart is left open.
    ///
    /// # Errors
    ///
    /// Stops at the first product that cannot be added.
    pub async fn add_products_to_cart<I, S>(&self, names: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add_product_to_cart(name.as_ref()).await?;
        }
        Ok(())
    }

    /// Open the cart overlay
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the cart is already open.
    pub async fn open_cart(&self) -> StoreResult<()> {
        self.click(&self.locators.cart_toggle).await?;
        self.wait_for_count(&self.locators.close_cart, 1, "cart open").await
    }

    /// Close the cart overlay
    ///
    /// # Errors
    ///
    /// Returns `ElementNotFound` if the cart is not open.
    pub async fn close_cart(&self) -> StoreResult<()> {
        self.click(&self.locators.close_cart).await?;
        self.wait_for_count(&self.locators.cart_toggle, 1, "cart closed").await
    }

    // -------------------------------------------------------------------------
    // Cart readouts
    // -------------------------------------------------------------------------

    /// Number of distinct line items
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn product_item_count(&self) -> StoreResult<usize> {
        self.driver.count(&self.locators.cart_items).await
    }

    /// Sum of all line quantities
    ///
    /// # Errors
    ///
    /// Returns `Parse` if a quantity readout is malformed.
    pub async fn total_cart_items_count(&self) -> StoreResult<u32> {
        let mut total = 0;
        for index in 0..self.product_item_count().await? {
            let item = self.locators.cart_items.clone().nth(index);
            total += self.quantity_of_item(&item).await?;
        }
        Ok(total)
    }

    /// Number on the cart badge
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the badge is not an integer.
    pub async fn badge_count(&self) -> StoreResult<u32> {
        let text = self.text_of(&self.locators.badge).await?;
        readout::parse_count(&text)
    }

    /// Assert that the badge equals the sum of line quantities
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` on mismatch.
    pub async fn verify_total_cart_items_count(&self) -> StoreResult<u32> {
        let badge = self.badge_count().await?;
        let total = self.total_cart_items_count().await?;
        if badge != total {
            return Err(StoreError::assertion(format!(
                "cart badge shows {badge} but line quantities sum to {total}"
            )));
        }
        tracing::debug!(badge, "badge count verified");
        Ok(badge)
    }

    /// Unit price shown inside `item`
    ///
    /// # Errors
    ///
    /// Returns `Parse` if no `$` amount is found.
    pub async fn price_of_item(&self, item: &Locator) -> StoreResult<Money> {
        let text = self
            .text_of(&item.clone().locator(Locator::css(ITEM_PRICE)))
            .await?;
        readout::parse_price(&text)
    }

    /// Quantity shown inside `item`
    ///
    /// # Errors
    ///
    /// Returns `Parse` if no `Quantity: N` readout is found.
    pub async fn quantity_of_item(&self, item: &Locator) -> StoreResult<u32> {
        let text = self.text_of(&item.clone().locator(quantity_readout())).await?;
        readout::parse_quantity(&text)
    }

    /// Snapshot every line in the cart
    ///
    /// # Errors
    ///
    /// Returns `Parse` if a readout is malformed.
    pub async fn line_items(&self) -> StoreResult<Vec<CartLine>> {
        let count = self.product_item_count().await?;
        let mut lines = Vec::with_capacity(count);
        for index in 0..count {
            let item = self.locators.cart_items.clone().nth(index);
            let name = self
                .text_of(&item.clone().locator(Locator::css("p").first()))
                .await?;
            lines.push(CartLine {
                name,
                price: self.price_of_item(&item).await?,
                quantity: self.quantity_of_item(&item).await?,
            });
        }
        Ok(lines)
    }

    /// Sum of price times quantity over all lines
    ///
    /// # Errors
    ///
    /// Returns `Parse` if a readout is malformed or the total overflows.
    pub async fn cart_item_costs(&self) -> StoreResult<Money> {
        let lines = self.line_items().await?;
        lines.iter().try_fold(Money::ZERO, |total, line| {
            let cost = line.cost()?;
            total
                .checked_add(cost)
                .ok_or_else(|| StoreError::parse("cart item costs", format!("{total} + {cost}")))
        })
    }

    /// Amount on the subtotal readout
    ///
    /// # Errors
    ///
    /// Returns `Parse` if no `$` amount is found.
    pub async fn cart_subtotal(&self) -> StoreResult<Money> {
        let text = self.text_of(&self.locators.subtotal).await?;
        readout::parse_price(&text)
    }

    /// Assert that the subtotal equals the summed line costs, to the cent
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` on mismatch.
    pub async fn verify_subtotal_matches_item_costs(&self) -> StoreResult<Money> {
        let subtotal = self.cart_subtotal().await?;
        let costs = self.cart_item_costs().await?;
        if subtotal != costs {
            return Err(StoreError::assertion(format!(
                "subtotal {subtotal} does not match item costs {costs}"
            )));
        }
        tracing::debug!(%subtotal, "subtotal verified");
        Ok(subtotal)
    }

    // -------------------------------------------------------------------------
    // Quantity changes
    // -------------------------------------------------------------------------

    /// Click `+` on a line `times` times, waiting for each increment to show
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for zero `times` before clicking anything,
    /// and `Timeout` if an increment never shows.
    pub async fn increase_product_quantity(&self, name: &str, times: u32) -> StoreResult<u32> {
        if times == 0 {
            return Err(StoreError::invalid_argument(
                "increase_product_quantity: times must be at least 1",
            ));
        }
        let item = self.line_item(name);
        let plus = self.plus_button(name);
        let mut quantity = self.quantity_of_item(&item).await?;

        for _ in 0..times {
            self.click(&plus).await?;
            quantity += 1;
            self.wait_for_quantity(&item, quantity).await?;
        }
        tracing::debug!(product = name, quantity, "quantity increased");
        Ok(quantity)
    }

    /// Click `-` on a line `times` times.
    ///
    /// Each click waits for the quantity to drop by one; the click that
    /// brings it to zero waits for the line to disappear instead.
    /// `current_quantity`, when given, is trusted instead of reading the page.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` before clicking anything when `times` is
    /// zero or exceeds the current quantity.
    pub async fn click_minus_n_times(
        &self,
        name: &str,
        times: u32,
        current_quantity: Option<u32>,
    ) -> StoreResult<u32> {
        if times == 0 {
            return Err(StoreError::invalid_argument(
                "click_minus_n_times: times must be at least 1",
            ));
        }
        if let Some(current) = current_quantity {
            check_minus_budget(times, current)?;
        }

        let item = self.line_item(name);
        let minus = self.minus_button(name);
        let mut quantity = match current_quantity {
            Some(current) => current,
            None => {
                let current = self.quantity_of_item(&item).await?;
                check_minus_budget(times, current)?;
                current
            }
        };

        for _ in 0..times {
            self.click(&minus).await?;
            quantity -= 1;
            if quantity == 0 {
                self.wait_for_count(&item, 0, &format!("{name:?} removed")).await?;
            } else {
                self.wait_for_quantity(&item, quantity).await?;
            }
        }
        tracing::debug!(product = name, quantity, "quantity decreased");
        Ok(quantity)
    }

    // -------------------------------------------------------------------------
    // Emptying
    // -------------------------------------------------------------------------

    /// Remove lines one at a time until none are left.
    ///
    /// Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` if a removal does not shrink the cart.
    pub async fn empty_cart_by_remove_button(&self) -> StoreResult<usize> {
        let items = &self.locators.cart_items;
        let first_remove = items.clone().first().locator(Locator::css(REMOVE_BUTTON));
        let driver = &self.driver;
        let mut removed = 0;

        loop {
            let remaining = driver.count(items).await?;
            if remaining == 0 {
                break;
            }
            self.click(&first_remove).await?;
            wait_until(&self.config.wait, "cart line removed", || async move {
                Ok(driver.count(items).await? < remaining)
            })
            .await?;
            removed += 1;
        }
        tracing::debug!(removed, "cart emptied");
        Ok(removed)
    }

    /// Assert that the empty-cart message shows within the settle timeout
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` if it never shows.
    pub async fn verify_cart_is_empty(&self) -> StoreResult<()> {
        let driver = &self.driver;
        let message = &self.locators.empty_cart_message;
        match wait_until(&self.config.wait, "empty cart message", || async move {
            driver.is_visible(message).await
        })
        .await
        {
            Ok(_) => Ok(()),
            Err(StoreError::Timeout { .. }) => {
                let lines = self.product_item_count().await?;
                Err(StoreError::assertion(format!(
                    "cart is not empty: {lines} line item(s) remain"
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the empty-cart message is showing right now
    ///
    /// # Errors
    ///
    /// Returns the driver's error.
    pub async fn is_cart_empty(&self) -> StoreResult<bool> {
        self.driver
            .is_visible(&self.locators.empty_cart_message)
            .await
    }
}

fn quantity_readout() -> Locator {
    Locator::css("p").has_text("Quantity:")
}

fn check_minus_budget(times: u32, current: u32) -> StoreResult<()> {
    if times > current {
        return Err(StoreError::invalid_argument(format!(
            "click_minus_n_times: cannot decrement {times} time(s) from quantity {current}"
        )));
    }
    Ok(())
}
