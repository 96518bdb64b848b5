//! Parsers for numeric readouts rendered by the storefront.
//!
//! A readout that does not match its pattern is an error, never a silent zero:
//! the caller decides whether a miss is fatal.

use crate::money::Money;
use crate::result::{StoreError, StoreResult};
use regex::Regex;
use std::sync::OnceLock;

fn products_found_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)\s*Product").expect("valid regex"))
}

fn price_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\s*([\d.]+)").expect("valid regex"))
}

fn quantity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Quantity:\s*(\d+)").expect("valid regex"))
}

/// Parse the leading count out of `"<N> Product(s) found"`.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if the text does not start with a count.
pub fn parse_products_found(text: &str) -> StoreResult<usize> {
    products_found_re()
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| StoreError::parse("products found count", text))
}

/// Parse the first `$<decimal>` amount in the text.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if no amount is present.
pub fn parse_price(text: &str) -> StoreResult<Money> {
    price_re()
        .captures(text)
        .and_then(|c| Money::parse_decimal(&c[1]))
        .ok_or_else(|| StoreError::parse("price", text))
}

/// Parse `Quantity: <int>` (case-insensitive).
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if no quantity is present.
pub fn parse_quantity(text: &str) -> StoreResult<u32> {
    quantity_re()
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .ok_or_else(|| StoreError::parse("quantity", text))
}

/// Parse a bare integer such as the cart badge.
///
/// # Errors
///
/// Returns [`StoreError::Parse`] if the trimmed text is not an integer.
pub fn parse_count(text: &str) -> StoreResult<u32> {
    text.trim()
        .parse()
        .map_err(|_| StoreError::parse("badge count", text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_found() {
        assert_eq!(parse_products_found("16 Product(s) found").unwrap(), 16);
        assert_eq!(parse_products_found("  1 Product(s) found").unwrap(), 1);
        assert_eq!(parse_products_found("0Product(s) found").unwrap(), 0);
    }

    #[test]
    fn test_products_found_miss_is_error() {
        let err = parse_products_found("Products: 4").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Parse {
                what: "products found count",
                ..
            }
        ));
        assert!(parse_products_found("").is_err());
    }

    #[test]
    fn test_price() {
        assert_eq!(parse_price("$ 27.00").unwrap(), Money::from_dollars(27));
        assert_eq!(parse_price("$14.9").unwrap(), Money::from_cents(1490));
        assert_eq!(parse_price("SUBTOTAL $ 95.90").unwrap().cents(), 9590);
        assert!(parse_price("27.00").is_err());
        assert!(parse_price("$ .").is_err());
    }

    #[test]
    fn test_quantity() {
        assert_eq!(parse_quantity("Quantity: 3").unwrap(), 3);
        assert_eq!(parse_quantity("L | Blue\nquantity:12").unwrap(), 12);
        assert!(parse_quantity("Qty 3").is_err());
    }

    #[test]
    fn test_count() {
        assert_eq!(parse_count(" 4 ").unwrap(), 4);
        assert!(parse_count("four").is_err());
    }
}
