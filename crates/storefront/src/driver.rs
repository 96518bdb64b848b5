//! StoreDriver - Abstract Browser Automation Trait
//!
//! The page object talks to the browser only through this trait, which keeps
//! it independent of the automation backend:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  StoreDriver (Abstract Trait)                                 │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────┐         ┌─────────────────────────┐  │
//! │  │  ChromiumDriver     │         │  FakeStorefront         │  │
//! │  │  (feature browser)  │         │  (in-memory replica)    │  │
//! │  │  CDP via            │         │  renders a Dom per      │  │
//! │  │  chromiumoxide      │         │  query                  │  │
//! │  └─────────────────────┘         └─────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every method re-reads the live page. Single-element methods (`click`,
//! `inner_text`, `is_visible`) are strict: zero matches is
//! [`StoreError::ElementNotFound`] and several matches is
//! [`StoreError::StrictModeViolation`]. Auto-waiting is layered on top by
//! the page object.

use crate::locator::Locator;
use crate::result::{StoreError, StoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Browser configuration for the driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 1280,
            viewport_height: 800,
            chromium_path: None,
            sandbox: true,
        }
    }
}

impl DriverConfig {
    /// Create new config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }
}

/// Abstract driver trait for browser automation
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// Navigate to URL
    async fn navigate(&mut self, url: &str) -> StoreResult<()>;

    /// Current page URL
    async fn current_url(&self) -> StoreResult<String>;

    /// Number of elements matching the locator
    async fn count(&self, locator: &Locator) -> StoreResult<usize>;

    /// Click the single matching element
    async fn click(&self, locator: &Locator) -> StoreResult<()>;

    /// Rendered text of the single matching element
    async fn inner_text(&self, locator: &Locator) -> StoreResult<String>;

    /// Whether the single matching element is displayed.
    ///
    /// Unlike the other single-element methods, zero matches is `false`.
    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool>;

    /// Release the browser
    async fn close(&mut self) -> StoreResult<()>;
}

/// Enforce strict single-element resolution on a match count.
///
/// # Errors
///
/// Returns `ElementNotFound` for zero matches, `StrictModeViolation` for more
/// than one.
pub fn expect_single(locator: &Locator, count: usize) -> StoreResult<()> {
    match count {
        1 => Ok(()),
        0 => Err(StoreError::ElementNotFound {
            locator: locator.to_string(),
            timeout_ms: 0,
        }),
        count => Err(StoreError::StrictModeViolation {
            locator: locator.to_string(),
            count,
        }),
    }
}
