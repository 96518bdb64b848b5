//! Locator abstraction for element selection.
//!
//! A [`Locator`] is an immutable chain of [`Step`]s, each narrowing the set
//! of matched elements: `css → has(text) → role(button, /add to cart/i)`.
//! The same chain is serialized to JSON for the in-browser resolver and
//! interpreted directly by the in-memory DOM, so both drivers agree on what
//! a locator means.
//!
//! # Design Philosophy
//!
//! - **Strict Selection**: actions fail if more than one element matches
//! - **Auto-Waiting**: callers retry resolution until the locator timeout
//! - **Fluent API**: chainable methods for building scoped selectors

use crate::result::{StoreError, StoreResult};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default timeout for auto-waiting (5 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Default polling interval for auto-waiting (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// How a text query compares against an element's normalized text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextMatch {
    /// Whole text equals the value (after whitespace normalization)
    Exact {
        /// Expected text
        text: String,
    },
    /// Regular expression search
    Pattern {
        /// Pattern source, in the common subset of Rust and JavaScript syntax
        source: String,
        /// Match case-insensitively
        case_insensitive: bool,
    },
}

impl TextMatch {
    /// Exact text match
    #[must_use]
    pub fn exact(text: impl Into<String>) -> Self {
        Self::Exact { text: text.into() }
    }

    /// Case-sensitive pattern match
    #[must_use]
    pub fn pattern(source: impl Into<String>) -> Self {
        Self::Pattern {
            source: source.into(),
            case_insensitive: false,
        }
    }

    /// Make a pattern case-insensitive (no-op for exact matches)
    #[must_use]
    pub fn ignore_case(self) -> Self {
        match self {
            Self::Pattern { source, .. } => Self::Pattern {
                source,
                case_insensitive: true,
            },
            exact @ Self::Exact { .. } => exact,
        }
    }

    /// Check text against this matcher. `text` is normalized first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnsupportedSelector`] if the pattern is invalid.
    pub fn matches(&self, text: &str) -> StoreResult<bool> {
        let text = normalize_whitespace(text);
        match self {
            Self::Exact { text: expected } => Ok(text == normalize_whitespace(expected)),
            Self::Pattern {
                source,
                case_insensitive,
            } => {
                let re = RegexBuilder::new(source)
                    .case_insensitive(*case_insensitive)
                    .build()
                    .map_err(|e| StoreError::UnsupportedSelector {
                        selector: source.clone(),
                        message: e.to_string(),
                    })?;
                Ok(re.is_match(&text))
            }
        }
    }
}

impl From<&str> for TextMatch {
    fn from(text: &str) -> Self {
        Self::exact(text)
    }
}

impl fmt::Display for TextMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact { text } => write!(f, "{text:?}"),
            Self::Pattern {
                source,
                case_insensitive,
            } => write!(f, "/{source}/{}", if *case_insensitive { "i" } else { "" }),
        }
    }
}

/// Collapse runs of whitespace to single spaces and trim
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// One narrowing step of a locator chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Descendants matching a CSS selector
    Css {
        /// Selector text
        selector: String,
    },
    /// Innermost descendants whose text matches
    Text {
        /// Text matcher
        text: TextMatch,
    },
    /// Descendants with an ARIA role and optional accessible name
    Role {
        /// Role name (e.g. `button`)
        role: String,
        /// Accessible name matcher
        name: Option<TextMatch>,
    },
    /// Direct element children
    Children,
    /// Keep elements containing a match of the inner chain
    Has {
        /// Inner chain, resolved relative to each candidate
        inner: Vec<Step>,
    },
    /// Keep elements whose text contains the value (case-insensitive)
    HasText {
        /// Substring to look for
        text: String,
    },
    /// Keep only the element at this position
    Nth {
        /// Zero-based index
        index: usize,
    },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css { selector } => write!(f, "css({selector:?})"),
            Self::Text { text } => write!(f, "text({text})"),
            Self::Role { role, name: None } => write!(f, "role({role})"),
            Self::Role {
                role,
                name: Some(name),
            } => write!(f, "role({role}, name={name})"),
            Self::Children => write!(f, "children"),
            Self::Has { inner } => write!(f, "has({})", join_steps(inner)),
            Self::HasText { text } => write!(f, "has_text({text:?})"),
            Self::Nth { index } => write!(f, "nth({index})"),
        }
    }
}

fn join_steps(steps: &[Step]) -> String {
    steps
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" >> ")
}

/// Locator options for customizing auto-wait behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorOptions {
    /// Timeout for auto-waiting
    pub timeout: Duration,
    /// Polling interval for auto-waiting
    pub poll_interval: Duration,
}

impl Default for LocatorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// A locator for finding elements.
///
/// Locators are cheap descriptions; nothing is queried until a driver
/// resolves them, and every resolution re-reads the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    steps: Vec<Step>,
    options: LocatorOptions,
}

impl Locator {
    fn from_step(step: Step) -> Self {
        Self {
            steps: vec![step],
            options: LocatorOptions::default(),
        }
    }

    fn push(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Locate by CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::from_step(Step::Css {
            selector: selector.into(),
        })
    }

    /// Locate by text content
    #[must_use]
    pub fn text(text: impl Into<TextMatch>) -> Self {
        Self::from_step(Step::Text { text: text.into() })
    }

    /// Locate by ARIA role and optional accessible name
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<TextMatch>) -> Self {
        Self::from_step(Step::Role {
            role: role.into(),
            name,
        })
    }

    /// Narrow to descendants matching another locator
    #[must_use]
    pub fn locator(mut self, inner: Self) -> Self {
        self.steps.extend(inner.steps);
        self
    }

    /// Narrow to direct children
    #[must_use]
    pub fn children(self) -> Self {
        self.push(Step::Children)
    }

    /// Keep elements that contain a match of `inner`
    #[must_use]
    pub fn has(self, inner: Self) -> Self {
        self.push(Step::Has { inner: inner.steps })
    }

    /// Keep elements whose text contains `text`
    #[must_use]
    pub fn has_text(self, text: impl Into<String>) -> Self {
        self.push(Step::HasText { text: text.into() })
    }

    /// Keep only the first match
    #[must_use]
    pub fn first(self) -> Self {
        self.nth(0)
    }

    /// Keep only the match at `index`
    #[must_use]
    pub fn nth(self, index: usize) -> Self {
        self.push(Step::Nth { index })
    }

    /// Set a custom auto-wait timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set a custom auto-wait poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.options.poll_interval = poll_interval;
        self
    }

    /// Get the steps
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get the options
    #[must_use]
    pub const fn options(&self) -> &LocatorOptions {
        &self.options
    }

    /// Serialize the step chain for the in-browser resolver
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn to_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string(&self.steps)?)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_steps(&self.steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod text_match_tests {
        use super::*;

        #[test]
        fn test_exact_normalizes_whitespace() {
            let m = TextMatch::exact("Blue T-Shirt");
            assert!(m.matches("  Blue   T-Shirt\n").unwrap());
            assert!(!m.matches("Blue T-Shirt Deluxe").unwrap());
            assert!(!m.matches("blue t-shirt").unwrap());
        }

        #[test]
        fn test_pattern_case_insensitive() {
            let m = TextMatch::pattern("add to cart").ignore_case();
            assert!(m.matches("Add to cart").unwrap());
            assert!(!TextMatch::pattern("add to cart")
                .matches("Add to cart")
                .unwrap());
        }

        #[test]
        fn test_pattern_escapes() {
            let m = TextMatch::pattern(r"Product\(s\) found");
            assert!(m.matches("16 Product(s) found").unwrap());
        }

        #[test]
        fn test_invalid_pattern() {
            let err = TextMatch::pattern("(").matches("x").unwrap_err();
            assert!(matches!(err, StoreError::UnsupportedSelector { .. }));
        }

        #[test]
        fn test_ignore_case_keeps_exact() {
            assert_eq!(TextMatch::exact("X").ignore_case(), TextMatch::exact("X"));
        }
    }

    mod locator_tests {
        use super::*;

        #[test]
        fn test_chain_building() {
            let loc = Locator::css("div.grid")
                .locator(Locator::css("div[tabindex=\"1\"]"))
                .has(Locator::text("Blue T-Shirt"))
                .locator(Locator::role(
                    "button",
                    Some(TextMatch::pattern("add to cart").ignore_case()),
                ));

            assert_eq!(loc.steps().len(), 4);
            assert!(matches!(loc.steps()[2], Step::Has { .. }));
        }

        #[test]
        fn test_display() {
            let loc = Locator::css("div.item")
                .has(Locator::text("Blue T-Shirt"))
                .has_text("+")
                .first();
            assert_eq!(
                loc.to_string(),
                r#"css("div.item") >> has(text("Blue T-Shirt")) >> has_text("+") >> nth(0)"#
            );
        }

        #[test]
        fn test_json_shape() {
            let loc = Locator::role("button", Some(TextMatch::exact("X"))).children();
            let json: serde_json::Value = serde_json::from_str(&loc.to_json().unwrap()).unwrap();
            assert_eq!(json[0]["op"], "role");
            assert_eq!(json[0]["name"]["kind"], "exact");
            assert_eq!(json[0]["name"]["text"], "X");
            assert_eq!(json[1]["op"], "children");
        }

        #[test]
        fn test_options() {
            let loc = Locator::css("p").with_timeout(Duration::from_millis(200));
            assert_eq!(loc.options().timeout, Duration::from_millis(200));
            assert_eq!(
                loc.options().poll_interval,
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
        }
    }
}
