//! Size filters offered by the storefront.
//!
//! The set is closed, so a filter that the page does not offer cannot be
//! requested.

use crate::result::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the size filter checkboxes
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeFilter {
    /// Extra small
    XS,
    /// Small
    S,
    /// Medium
    M,
    /// Medium-large
    ML,
    /// Large
    L,
    /// Extra large
    XL,
    /// Extra extra large
    XXL,
}

impl SizeFilter {
    /// Every size, in the order the page lists them
    pub const ALL: [Self; 7] = [
        Self::XS,
        Self::S,
        Self::M,
        Self::ML,
        Self::L,
        Self::XL,
        Self::XXL,
    ];

    /// Checkbox `value` attribute for this size
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::XS => "XS",
            Self::S => "S",
            Self::M => "M",
            Self::ML => "ML",
            Self::L => "L",
            Self::XL => "XL",
            Self::XXL => "XXL",
        }
    }
}

impl fmt::Display for SizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeFilter {
    type Err = StoreError;

    fn from_str(s: &str) -> StoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                StoreError::invalid_argument(format!(
                    "unknown size {s:?}; expected one of XS, S, M, ML, L, XL, XXL"
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for size in SizeFilter::ALL {
            assert_eq!(size.to_string().parse::<SizeFilter>().unwrap(), size);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("ml".parse::<SizeFilter>().unwrap(), SizeFilter::ML);
        assert_eq!(" xxl ".parse::<SizeFilter>().unwrap(), SizeFilter::XXL);
    }

    #[test]
    fn test_unknown_size_rejected() {
        let err = "XXXL".parse::<SizeFilter>().unwrap_err();
        assert!(err.is_precondition());
    }
}
