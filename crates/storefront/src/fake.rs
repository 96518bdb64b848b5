//! In-memory replica of the storefront under test.
//!
//! [`FakeStorefront`] keeps the application state (catalog, active filters,
//! cart lines, cart overlay) and re-renders it into a [`Dom`] on every driver
//! call, using the markup and class names of the live application. The
//! production locators therefore run against it unchanged, which lets the
//! page object and the full scenario run in `cargo test` without a browser.
//!
//! A configurable render lag keeps each state change invisible for a number
//! of reads, to exercise condition-based waits.

use crate::dom::{Dom, Element, NodeId};
use crate::driver::{expect_single, StoreDriver};
use crate::locator::Locator;
use crate::money::Money;
use crate::result::{StoreError, StoreResult};
use crate::size::SizeFilter;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A product offered in the grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Exact display name
    pub name: String,
    /// Unit price
    pub price: Money,
    /// Sizes the product is available in
    pub sizes: Vec<SizeFilter>,
    /// Short style description shown in the cart
    pub style: String,
}

impl Product {
    /// Create a product
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        price: Money,
        sizes: impl IntoIterator<Item = SizeFilter>,
        style: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price,
            sizes: sizes.into_iter().collect(),
            style: style.into(),
        }
    }
}

/// The catalog rendered by default
#[must_use]
pub fn default_catalog() -> Vec<Product> {
    use SizeFilter::{L, M, ML, S, XL, XS, XXL};
    vec![
        Product::new("Cropped Stay Groovy off white", Money::from_cents(1090), [L, XL, XXL], "White"),
        Product::new("Basic Cactus White T-shirt", Money::from_cents(1325), [L, XL], "White with cactus"),
        Product::new("Skater Black Sweatshirt", Money::from_cents(2590), [XS, S], "Black with custom print"),
        Product::new("Black Tule Oversized", Money::from_cents(2945), [S, M], "Black"),
        Product::new("Black Batman T-shirt", Money::from_cents(1090), [XS, S, M], "Black"),
        Product::new("Blue T-Shirt", Money::from_dollars(27), [M, ML, L], "Blue"),
        Product::new("Loose Black T-shirt", Money::from_cents(1400), [XL, XXL], "Black"),
        Product::new("Tso 3D Short Sleeve T-Shirt A", Money::from_cents(1090), [ML, L], "Grey"),
        Product::new("Black T-shirt with white stripes", Money::from_cents(1490), [S, M, L], "Black with white stripes"),
        Product::new("Grey T-shirt", Money::from_cents(1490), [XXL], "Grey"),
    ]
}

/// What a click on a rendered element does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Toggle a size filter checkbox
    ToggleSize(SizeFilter),
    /// Add a product (opens the cart)
    AddToCart(String),
    /// Open the cart overlay
    OpenCart,
    /// Close the cart overlay
    CloseCart,
    /// Increment a line's quantity
    Increment(String),
    /// Decrement a line's quantity, removing it below 1
    Decrement(String),
    /// Remove a line
    Remove(String),
    /// Checkout (no state change)
    Checkout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CartLine {
    product: Product,
    quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AppState {
    loaded: bool,
    filters: BTreeSet<SizeFilter>,
    cart: Vec<CartLine>,
    cart_open: bool,
}

impl AppState {
    fn apply(&mut self, catalog: &[Product], action: &ClickAction) {
        match action {
            ClickAction::ToggleSize(size) => {
                if !self.filters.remove(size) {
                    let _ = self.filters.insert(*size);
                }
            }
            ClickAction::AddToCart(name) => {
                if let Some(line) = self.line_mut(name) {
                    line.quantity += 1;
                } else if let Some(product) = catalog.iter().find(|p| &p.name == name) {
                    self.cart.push(CartLine {
                        product: product.clone(),
                        quantity: 1,
                    });
                }
                self.cart_open = true;
            }
            ClickAction::OpenCart => self.cart_open = true,
            ClickAction::CloseCart => self.cart_open = false,
            ClickAction::Increment(name) => {
                if let Some(line) = self.line_mut(name) {
                    line.quantity += 1;
                }
            }
            ClickAction::Decrement(name) => {
                if let Some(line) = self.line_mut(name) {
                    line.quantity -= 1;
                }
                self.cart.retain(|l| l.quantity > 0);
            }
            ClickAction::Remove(name) => self.cart.retain(|l| &l.product.name != name),
            ClickAction::Checkout => {}
        }
    }

    fn line_mut(&mut self, name: &str) -> Option<&mut CartLine> {
        self.cart.iter_mut().find(|l| l.product.name == name)
    }

    fn badge(&self) -> u32 {
        self.cart.iter().map(|l| l.quantity).sum()
    }

    fn subtotal(&self) -> Money {
        self.cart.iter().map(|l| l.product.price * l.quantity).sum()
    }

    fn visible_products<'a>(&self, catalog: &'a [Product]) -> Vec<&'a Product> {
        catalog
            .iter()
            .filter(|p| self.filters.is_empty() || p.sizes.iter().any(|s| self.filters.contains(s)))
            .collect()
    }
}

// =============================================================================
// RENDERING
// =============================================================================

type Node = Element<ClickAction>;

fn render(state: &AppState, catalog: &[Product]) -> Dom<ClickAction> {
    let body = Node::new("body");
    if !state.loaded {
        return Dom::new(body);
    }
    Dom::new(
        body.child(
            Node::new("main")
                .child(render_filters(state))
                .child(render_shelf(state, catalog)),
        )
        .child(render_cart(state)),
    )
}

fn render_filters(state: &AppState) -> Node {
    Node::new("div")
        .class("sc-bj2vay-0 kdbWFJ")
        .child(Node::new("h4").text("Sizes:"))
        .children(SizeFilter::ALL.into_iter().map(|size| {
            Node::new("div").class("sc-bj2vay-1 fEUPSg").child(
                Node::new("label")
                    .on_click(ClickAction::ToggleSize(size))
                    .child(
                        Node::new("input")
                            .attr("data-testid", "checkbox")
                            .attr("type", "checkbox")
                            .attr("value", size.as_str())
                            .attr(
                                "aria-checked",
                                if state.filters.contains(&size) { "true" } else { "false" },
                            ),
                    )
                    .child(Node::new("span").class("checkmark").text(size.as_str())),
            )
        }))
}

fn render_shelf(state: &AppState, catalog: &[Product]) -> Node {
    let products = state.visible_products(catalog);
    Node::new("div")
        .class("sc-ebmerl-4 iliWeY")
        .child(
            Node::new("div")
                .class("sc-ebmerl-2 fIaSJn")
                .child(Node::new("p").text(format!("{} Product(s) found", products.len()))),
        )
        .child(
            Node::new("div")
                .class("sc-uhudcz-0 iZZGui")
                .children(products.into_iter().map(render_card)),
        )
}

fn render_card(product: &Product) -> Node {
    Node::new("div")
        .class("sc-124al1g-2 dwOYCh")
        .attr("tabindex", "1")
        .child(Node::new("div").class("sc-124al1g-1 loqWBz").attr("alt", product.name.clone()))
        .child(Node::new("p").class("sc-124al1g-4 eeXMBo").text(product.name.clone()))
        .child(
            Node::new("div")
                .class("sc-124al1g-5 cQGQzx")
                .child(Node::new("p").class("sc-124al1g-6 ljgnQL").text(format!("$ {}", money_digits(product.price)))),
        )
        .child(
            Node::new("button")
                .class("sc-124al1g-0 jCsgpZ")
                .text("Add to cart")
                .on_click(ClickAction::AddToCart(product.name.clone())),
        )
}

fn cart_icon(badge: u32) -> Node {
    Node::new("div")
        .class("sc-1h98xa9-2 fGgnoG")
        .child(Node::new("div").class("sc-1h98xa9-3 VLMSP").text(badge.to_string()))
}

fn render_cart(state: &AppState) -> Node {
    let badge = state.badge();
    let cart = Node::new("div").class("sc-1h98xa9-1 kQlqIC");

    if !state.cart_open {
        let cart = cart.child(
            Node::new("button")
                .class("sc-1h98xa9-0 gFkyvN")
                .on_click(ClickAction::OpenCart)
                .child(cart_icon(badge)),
        );
        // The closed drawer stays mounted off-screen.
        if state.cart.is_empty() {
            return cart.child(
                Node::new("div")
                    .class("sc-1h98xa9-4 cBRWGV")
                    .hidden(true)
                    .child(empty_message()),
            );
        }
        return cart;
    }

    let lines: Vec<Node> = if state.cart.is_empty() {
        vec![empty_message()]
    } else {
        state.cart.iter().map(render_line).collect()
    };

    cart.child(
        Node::new("button")
            .class("sc-1h98xa9-0 gFkyvN")
            .text("X")
            .on_click(ClickAction::CloseCart),
    )
    .child(
        Node::new("div")
            .class("sc-1h98xa9-4 cBRWGV")
            .child(
                Node::new("div")
                    .class("sc-1h98xa9-5 ejgDrt")
                    .child(Node::new("div").class("sc-1h98xa9-6 gHMsvW").child(cart_icon(badge)))
                    .child(Node::new("span").class("sc-1h98xa9-7 cxzKB").text("Cart")),
            )
            .child(Node::new("div").class("sc-7th5t8-0 cllWgv").children(lines))
            .child(
                Node::new("div")
                    .class("sc-1h98xa9-8 bciIxg")
                    .child(Node::new("p").class("sc-1h98xa9-10 kNdOle").text("SUBTOTAL"))
                    .child(
                        Node::new("p")
                            .class("sc-1h98xa9-9 jzywDV")
                            .text(format!("$ {}", money_digits(state.subtotal()))),
                    )
                    .child(
                        Node::new("button")
                            .class("sc-1h98xa9-11 gnXVNU")
                            .text("Checkout")
                            .on_click(ClickAction::Checkout),
                    ),
            ),
    )
}

fn empty_message() -> Node {
    Node::new("p")
        .class("sc-7th5t8-1 hqDkK")
        .text("Add some products in the cart :)")
}

fn render_line(line: &CartLine) -> Node {
    let name = &line.product.name;
    let size = line.product.sizes.first().map_or("", |s| s.as_str());
    Node::new("div")
        .class("sc-11uohgb-0 hDmOrM")
        .child(
            Node::new("button")
                .class("sc-11uohgb-5 bgZtMd")
                .attr("title", "remove product from cart")
                .on_click(ClickAction::Remove(name.clone())),
        )
        .child(Node::new("img").class("sc-11uohgb-1 hiiZHf").attr("alt", name.clone()))
        .child(
            Node::new("div")
                .class("sc-11uohgb-2 elbkhN")
                .child(Node::new("p").class("sc-11uohgb-3 iDnYSL").text(name.clone()))
                .child(Node::new("p").class("sc-11uohgb-3 iDnYSL").text(format!(
                    "{size} | {}\nQuantity: {}",
                    line.product.style, line.quantity
                ))),
        )
        .child(
            Node::new("div")
                .class("sc-11uohgb-4 bnZqjD")
                .child(Node::new("p").text(format!("$ {}", money_digits(line.product.price))))
                .child(
                    Node::new("div")
                        .child(
                            Node::new("button")
                                .class("sc-11uohgb-6 hzjxCk")
                                .text("-")
                                .on_click(ClickAction::Decrement(name.clone())),
                        )
                        .child(
                            Node::new("button")
                                .class("sc-11uohgb-6 hzjxCk")
                                .text("+")
                                .on_click(ClickAction::Increment(name.clone())),
                        ),
                ),
        )
}

fn money_digits(amount: Money) -> String {
    amount.to_string().trim_start_matches('$').to_string()
}

// =============================================================================
// DRIVER
// =============================================================================

#[derive(Debug)]
struct Inner {
    url: String,
    state: AppState,
    shown: AppState,
    stale_reads: u32,
    history: Vec<ClickAction>,
}

/// In-memory storefront implementing [`StoreDriver`]
#[derive(Debug)]
pub struct FakeStorefront {
    catalog: Vec<Product>,
    render_lag: u32,
    inner: Mutex<Inner>,
}

impl Default for FakeStorefront {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStorefront {
    /// Create a storefront with the default catalog
    #[must_use]
    pub fn new() -> Self {
        Self::with_catalog(default_catalog())
    }

    /// Create a storefront with a custom catalog
    #[must_use]
    pub fn with_catalog(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            render_lag: 0,
            inner: Mutex::new(Inner {
                url: String::from("about:blank"),
                state: AppState::default(),
                shown: AppState::default(),
                stale_reads: 0,
                history: Vec::new(),
            }),
        }
    }

    /// Keep each state change hidden for `reads` further queries
    #[must_use]
    pub const fn with_render_lag(mut self, reads: u32) -> Self {
        self.render_lag = reads;
        self
    }

    /// The catalog being served
    #[must_use]
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    /// Every click that triggered an action, in order
    #[must_use]
    pub fn history(&self) -> Vec<ClickAction> {
        self.lock().history.clone()
    }

    /// Number of clicks that triggered an action
    #[must_use]
    pub fn click_count(&self) -> usize {
        self.lock().history.len()
    }

    /// Current `(name, quantity)` cart lines, bypassing render lag
    #[must_use]
    pub fn cart_lines(&self) -> Vec<(String, u32)> {
        self.lock()
            .state
            .cart
            .iter()
            .map(|l| (l.product.name.clone(), l.quantity))
            .collect()
    }

    /// Currently active filters, bypassing render lag
    #[must_use]
    pub fn active_filters(&self) -> Vec<SizeFilter> {
        self.lock().state.filters.iter().copied().collect()
    }

    /// Whether the cart overlay is open, bypassing render lag
    #[must_use]
    pub fn is_cart_open(&self) -> bool {
        self.lock().state.cart_open
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render what the user currently sees, advancing render lag
    fn snapshot(&self) -> Dom<ClickAction> {
        let mut inner = self.lock();
        if inner.stale_reads > 0 {
            inner.stale_reads -= 1;
        } else {
            inner.shown = inner.state.clone();
        }
        render(&inner.shown, &self.catalog)
    }

    fn resolve_single(
        &self,
        locator: &Locator,
    ) -> StoreResult<(Dom<ClickAction>, NodeId)> {
        let dom = self.snapshot();
        let matches = dom.resolve(locator.steps())?;
        expect_single(locator, matches.len())?;
        let id = matches[0];
        Ok((dom, id))
    }
}

#[async_trait]
impl StoreDriver for FakeStorefront {
    async fn navigate(&mut self, url: &str) -> StoreResult<()> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoreError::NavigationError {
                url: url.to_string(),
                message: "unsupported scheme".to_string(),
            });
        }
        let mut inner = self.lock();
        inner.url = url.to_string();
        inner.state = AppState {
            loaded: true,
            ..AppState::default()
        };
        inner.shown = inner.state.clone();
        inner.stale_reads = 0;
        tracing::debug!(url, "fake storefront loaded");
        Ok(())
    }

    async fn current_url(&self) -> StoreResult<String> {
        Ok(self.lock().url.clone())
    }

    async fn count(&self, locator: &Locator) -> StoreResult<usize> {
        Ok(self.snapshot().resolve(locator.steps())?.len())
    }

    async fn click(&self, locator: &Locator) -> StoreResult<()> {
        let (dom, id) = self.resolve_single(locator)?;
        if !dom.is_visible(id) {
            return Err(StoreError::PageError {
                message: format!("{locator} is not visible"),
            });
        }
        let Some(action) = dom.click_action(id) else {
            return Ok(());
        };

        let mut inner = self.lock();
        inner.state.apply(&self.catalog, &action);
        inner.stale_reads = self.render_lag;
        inner.history.push(action);
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> StoreResult<String> {
        let (dom, id) = self.resolve_single(locator)?;
        Ok(dom.inner_text(id))
    }

    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool> {
        let dom = self.snapshot();
        let matches = dom.resolve(locator.steps())?;
        if matches.is_empty() {
            return Ok(false);
        }
        expect_single(locator, matches.len())?;
        Ok(dom.is_visible(matches[0]))
    }

    async fn close(&mut self) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.url = String::from("about:blank");
        inner.state = AppState::default();
        inner.shown = AppState::default();
        Ok(())
    }
}
