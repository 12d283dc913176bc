//! Exact-decimal price and opaque-string size, the two scalar types every
//! other piece of the engine is built on.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A price parse failure: the exchange sent something that does not parse
/// as a decimal number.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The price string was not a valid decimal.
    InvalidPrice {
        /// The offending input.
        input: String,
    },
    /// The size string was not a valid decimal.
    InvalidSize {
        /// The offending input.
        input: String,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidPrice { input } => write!(f, "invalid price: {input:?}"),
            ParseError::InvalidSize { input } => write!(f, "invalid size: {input:?}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// An exact-decimal price.
///
/// Prices are compared and ordered decimal-exactly (no binary-float
/// rounding): `Price` wraps [`rust_decimal::Decimal`] rather than `f64`, so
/// `Ord`/`Eq` fall straight out of the underlying type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Price(pub Decimal);

impl Price {
    /// Parses a price from the exchange's textual representation.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidPrice`] if `input` is not a valid decimal.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        Decimal::from_str(input)
            .map(Price)
            .map_err(|_| ParseError::InvalidPrice {
                input: input.to_string(),
            })
    }

    /// The sign-flipped price, used as the bid-side sort key so that a
    /// single ascending comparator serves both polarities.
    pub fn negated(self) -> Self {
        Price(-self.0)
    }

    /// Converts to `f64` for the float-valued [`crate::engine::types::OrderBook`] projection.
    pub fn to_f64(self) -> f64 {
        // Losing bits beyond f64's mantissa is expected at this boundary.
        self.0.try_into().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Price::parse(s)
    }
}

/// A size, kept as the exchange's original decimal string.
///
/// Sizes are never reformatted: the transcript and the Halfbook both carry
/// the upstream's textual form verbatim, and decimal parsing happens only
/// on demand (zero-checks, numeric comparisons). A size of `"0"` is the
/// canonical deletion sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Size(pub String);

impl Size {
    /// Constructs a size from a string slice.
    pub fn new(s: impl Into<String>) -> Self {
        Size(s.into())
    }

    /// The canonical empty/not-found sentinel used by `Halfbook::qty_at`.
    pub fn empty() -> Self {
        Size(String::new())
    }

    /// Whether this size is empty (the not-found sentinel), as opposed to a
    /// parsed decimal zero.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parses the decimal value and reports whether it is zero.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidSize`] if the string is not a valid decimal.
    pub fn is_zero(&self) -> Result<bool, ParseError> {
        Decimal::from_str(&self.0)
            .map(|d| d.is_zero())
            .map_err(|_| ParseError::InvalidSize {
                input: self.0.clone(),
            })
    }

    /// Parses the decimal value for numeric comparisons.
    ///
    /// # Errors
    /// Returns [`ParseError::InvalidSize`] if the string is not a valid decimal.
    pub fn to_decimal(&self) -> Result<Decimal, ParseError> {
        Decimal::from_str(&self.0).map_err(|_| ParseError::InvalidSize {
            input: self.0.clone(),
        })
    }

    /// Converts to `f64` for the float-valued `OrderBook` projection.
    pub fn to_f64(&self) -> f64 {
        self.0.parse().unwrap_or(0.0)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Size {
    fn from(s: &str) -> Self {
        Size(s.to_string())
    }
}

impl From<String> for Size {
    fn from(s: String) -> Self {
        Size(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_parses_and_orders_decimal_exact() {
        let a = Price::parse("99.50").unwrap();
        let b = Price::parse("99.5").unwrap();
        assert_eq!(a, b, "decimal-exact equality ignores trailing zero scale");
        assert!(Price::parse("101").unwrap() > Price::parse("100").unwrap());
    }

    #[test]
    fn price_rejects_garbage() {
        assert!(Price::parse("not-a-number").is_err());
    }

    #[test]
    fn size_zero_detection() {
        assert!(Size::new("0").is_zero().unwrap());
        assert!(Size::new("0.0").is_zero().unwrap());
        assert!(!Size::new("0.01").is_zero().unwrap());
        assert!(Size::new("nope").is_zero().is_err());
    }

    #[test]
    fn size_empty_is_the_not_found_sentinel() {
        assert!(Size::empty().is_empty());
        assert!(!Size::new("0").is_empty());
    }
}
