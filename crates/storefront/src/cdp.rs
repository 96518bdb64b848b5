//! Chromium driver over the DevTools protocol.
//!
//! Locators are resolved in the page by an embedded JavaScript resolver that
//! walks the same [`Step`](crate::locator::Step) chain as the in-memory DOM.
//! Each driver call sends one `Runtime.evaluate` carrying the serialized
//! chain and an action, and gets back the match count plus the action's
//! result. Strictness is checked on the Rust side.

use crate::driver::{expect_single, DriverConfig, StoreDriver};
use crate::locator::Locator;
use crate::result::{StoreError, StoreResult};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Locator resolver evaluated in the page: `(steps, action) => {count, value}`
const RESOLVER: &str = r#"(steps, action) => {
  const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
  const textOf = (el) => norm(el.innerText !== undefined ? el.innerText : el.textContent);
  const matches = (m, text) => {
    const t = norm(text);
    if (m.kind === 'exact') return t === norm(m.text);
    return new RegExp(m.source, m.case_insensitive ? 'i' : '').test(t);
  };
  const ordered = (els) => {
    const out = [...new Set(els)];
    out.sort((a, b) => (a === b ? 0 : a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING ? -1 : 1));
    return out;
  };
  const all = (root) => [...root.querySelectorAll('*')];
  const roleOf = (el) => {
    const explicit = el.getAttribute('role');
    if (explicit) return explicit;
    const tag = el.tagName.toLowerCase();
    if (tag === 'button') return 'button';
    if (tag === 'input' && (el.getAttribute('type') || '').toLowerCase() === 'checkbox') return 'checkbox';
    return null;
  };
  const nameOf = (el) => el.getAttribute('aria-label') || textOf(el) || el.getAttribute('title') || '';
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    return style.visibility !== 'hidden' && style.display !== 'none' && rect.width > 0 && rect.height > 0;
  };
  const apply = (roots, chain) => chain.reduce((current, step) => {
    switch (step.op) {
      case 'css':
        return ordered(current.flatMap((r) => [...r.querySelectorAll(step.selector)]));
      case 'text':
        return ordered(current.flatMap((r) => all(r).filter((el) =>
          matches(step.text, el.textContent) &&
          ![...el.children].some((c) => matches(step.text, c.textContent)))));
      case 'role':
        return ordered(current.flatMap((r) => all(r).filter((el) =>
          roleOf(el) === step.role && (!step.name || matches(step.name, nameOf(el))))));
      case 'children':
        return ordered(current.flatMap((r) => [...r.children]));
      case 'has':
        return current.filter((el) => apply([el], step.inner).length > 0);
      case 'has_text':
        return current.filter((el) => norm(el.textContent).toLowerCase().includes(norm(step.text).toLowerCase()));
      case 'nth':
        return step.index < current.length ? [current[step.index]] : [];
      default:
        throw new Error('unknown locator step: ' + step.op);
    }
  }, roots);

  const found = apply([document], steps);
  const single = found.length === 1 ? found[0] : null;
  let value = null;
  if (action === 'text' && single) value = single.innerText;
  if (action === 'visible' && single) value = visible(single);
  if (action === 'click' && single) {
    single.scrollIntoView({ block: 'center' });
    single.click();
    value = true;
  }
  return { count: found.length, value };
}"#;

#[derive(Debug, Clone, Copy)]
enum Action {
    Count,
    Click,
    Text,
    Visible,
}

impl Action {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Click => "click",
            Self::Text => "text",
            Self::Visible => "visible",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Resolved<T> {
    count: usize,
    value: Option<T>,
}

fn expression(locator: &Locator, action: Action) -> StoreResult<String> {
    Ok(format!(
        "({RESOLVER})({}, {:?})",
        locator.to_json()?,
        action.as_str()
    ))
}

/// [`StoreDriver`] backed by a real Chromium instance
#[derive(Debug)]
pub struct ChromiumDriver {
    config: DriverConfig,
    browser: Arc<Mutex<CdpBrowser>>,
    page: CdpPage,
    handle: tokio::task::JoinHandle<()>,
}

impl ChromiumDriver {
    /// Launch Chromium and open a blank page
    ///
    /// # Errors
    ///
    /// Returns `BrowserLaunchError` if Chromium cannot be started.
    pub async fn launch(config: DriverConfig) -> StoreResult<Self> {
        let mut builder = CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

        if !config.headless {
            builder = builder.with_head();
        }

        if !config.sandbox {
            builder = builder.no_sandbox();
        }

        if let Some(ref path) = config.chromium_path {
            builder = builder.chrome_executable(path);
        }

        let cdp_config = builder
            .build()
            .map_err(|message| StoreError::BrowserLaunchError { message })?;

        let (browser, mut handler) =
            CdpBrowser::launch(cdp_config)
                .await
                .map_err(|e| StoreError::BrowserLaunchError {
                    message: e.to_string(),
                })?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| StoreError::PageError {
                message: e.to_string(),
            })?;

        tracing::debug!(headless = config.headless, "chromium launched");
        Ok(Self {
            config,
            browser: Arc::new(Mutex::new(browser)),
            page,
            handle,
        })
    }

    /// Launch settings in use
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    async fn query<T: DeserializeOwned>(
        &self,
        locator: &Locator,
        action: Action,
    ) -> StoreResult<Resolved<T>> {
        let expr = expression(locator, action)?;
        let result = self
            .page
            .evaluate(expr)
            .await
            .map_err(|e| StoreError::ScriptError {
                message: format!("{locator}: {e}"),
            })?;
        result.into_value().map_err(|e| StoreError::ScriptError {
            message: format!("{locator}: {e}"),
        })
    }

    async fn single<T: DeserializeOwned>(&self, locator: &Locator, action: Action) -> StoreResult<T> {
        let resolved = self.query::<T>(locator, action).await?;
        expect_single(locator, resolved.count)?;
        resolved.value.ok_or_else(|| StoreError::ScriptError {
            message: format!("{locator}: {} returned no value", action.as_str()),
        })
    }
}

#[async_trait]
impl StoreDriver for ChromiumDriver {
    async fn navigate(&mut self, url: &str) -> StoreResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| StoreError::NavigationError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn current_url(&self) -> StoreResult<String> {
        let url = self.page.url().await.map_err(|e| StoreError::PageError {
            message: e.to_string(),
        })?;
        Ok(url.unwrap_or_else(|| String::from("about:blank")))
    }

    async fn count(&self, locator: &Locator) -> StoreResult<usize> {
        Ok(self.query::<serde_json::Value>(locator, Action::Count).await?.count)
    }

    async fn click(&self, locator: &Locator) -> StoreResult<()> {
        let _: bool = self.single(locator, Action::Click).await?;
        Ok(())
    }

    async fn inner_text(&self, locator: &Locator) -> StoreResult<String> {
        self.single(locator, Action::Text).await
    }

    async fn is_visible(&self, locator: &Locator) -> StoreResult<bool> {
        let resolved = self.query::<bool>(locator, Action::Visible).await?;
        if resolved.count == 0 {
            return Ok(false);
        }
        expect_single(locator, resolved.count)?;
        Ok(resolved.value.unwrap_or(false))
    }

    async fn close(&mut self) -> StoreResult<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| StoreError::BrowserLaunchError {
                message: e.to_string(),
            })?;
        let _ = browser.wait().await;
        self.handle.abort();
        tracing::debug!("chromium closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::TextMatch;

    #[test]
    fn test_expression_embeds_chain_and_action() {
        let locator = Locator::css("div.cart").has(Locator::text(TextMatch::exact("Blue")));
        let expr = expression(&locator, Action::Click).unwrap();
        assert!(expr.starts_with("((steps, action) =>"));
        assert!(expr.ends_with(r#"[{"op":"css","selector":"div.cart"},{"op":"has","inner":[{"op":"text","text":{"kind":"exact","text":"Blue"}}]}], "click")"#));
    }

    #[test]
    fn test_resolver_handles_every_step() {
        for op in ["'css'", "'text'", "'role'", "'children'", "'has'", "'has_text'", "'nth'"] {
            assert!(RESOLVER.contains(op), "resolver is missing {op}");
        }
    }

    #[tokio::test]
    #[ignore = "requires a Chromium binary"]
    async fn test_launch_and_blank_page() {
        let mut driver = ChromiumDriver::launch(DriverConfig::new().with_no_sandbox())
            .await
            .unwrap();
        assert_eq!(driver.count(&Locator::css("button")).await.unwrap(), 0);
        driver.close().await.unwrap();
    }
}
