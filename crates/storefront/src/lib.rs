//! Storefront E2E: browser tests for a demo clothing store
//!
//! A page object over the storefront's product grid, size filters and cart
//! overlay, plus the shopping cart scenario that exercises them end to end.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    STOREFRONT E2E Architecture                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────────────┐    │
//! │   │ Shopping   │    │ StorePage  │    │ StoreDriver        │    │
//! │   │ Cart       │───►│ (page      │───►│  ChromiumDriver    │    │
//! │   │ Scenario   │    │  object)   │    │  FakeStorefront    │    │
//! │   └────────────┘    └────────────┘    └────────────────────┘    │
//! │         │                 │                                     │
//! │         ▼                 ▼                                     │
//! │   ┌────────────┐    ┌────────────┐                              │
//! │   │ LogContext │    │ Locator    │                              │
//! │   └────────────┘    └────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Without the `browser` feature everything runs against
//! [`FakeStorefront`], an in-memory replica rendering the live app's markup.

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod config;
mod dom;
mod driver;
mod fake;
mod locator;
mod logging;
mod money;
mod page;
mod readout;
mod result;
mod scenario;
mod size;
mod wait;

#[cfg(feature = "browser")]
mod cdp;

pub use config::{
    StoreConfig, DEFAULT_STORE_URL, ENV_CHROMIUM_PATH, ENV_HEADED, ENV_LOG_LEVEL, ENV_STORE_URL,
};
pub use dom::{Dom, Element, NodeId};
pub use driver::{expect_single, DriverConfig, StoreDriver};
pub use fake::{default_catalog, ClickAction, FakeStorefront, Product};
pub use locator::{
    normalize_whitespace, Locator, LocatorOptions, Step, TextMatch, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_TIMEOUT_MS,
};
pub use logging::{error_chain, LogContext, LogLevel};
pub use money::Money;
pub use page::{CartLine, StoreLocators, StorePage};
pub use readout::{parse_count, parse_price, parse_products_found, parse_quantity};
pub use result::{StoreError, StoreResult};
pub use scenario::{
    ScenarioOutcome, ShoppingCartScenario, EXTRA_QUANTITY, SCENARIO_FILTERS, SCENARIO_PRODUCTS,
    STEP_COUNT,
};
pub use size::SizeFilter;
pub use wait::{wait_for, wait_until, WaitOptions, WaitResult, DEFAULT_WAIT_TIMEOUT_MS};

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

/// Prelude for convenient imports
pub mod prelude {
    pub use super::{
        FakeStorefront, Locator, LogContext, LogLevel, Money, ScenarioOutcome,
        ShoppingCartScenario, SizeFilter, StoreConfig, StoreDriver, StoreError, StorePage,
        StoreResult, TextMatch, WaitOptions,
    };

    #[cfg(feature = "browser")]
    pub use super::ChromiumDriver;
}
