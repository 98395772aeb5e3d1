//! Amount type for handling monetary values.
//!
//! This module provides the `Amount` type which wraps `Decimal` and guarantees that the value is
//! non-negative and has at most two fractional digits. Whether money came in or went out is
//! carried by the transaction type, never by the sign of the amount.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Currency symbols that are tolerated, and discarded, at the start of textual input.
const CURRENCY_PREFIXES: &[char] = &['₹', '$', '€', '£'];

/// Number of fractional digits kept.
const SCALE: u32 = 2;

/// The largest amount accepted. Totals over many such amounts still fit in a `Decimal`.
const MAX_WHOLE: i64 = 999_999_999_999;

/// Represents a non-negative amount of money.
///
/// # Examples
///
/// ```
/// # use club_expenses::model::Amount;
/// # use std::str::FromStr;
/// let amount = Amount::from_str("₹1,250.5").unwrap();
/// assert_eq!(amount.to_string(), "1250.5");
/// assert_eq!(amount.formatted("₹"), "₹1,250.50");
/// assert!(Amount::from_str("-3").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    value: Decimal,
}

impl Amount {
    pub const ZERO: Amount = Amount {
        value: Decimal::ZERO,
    };

    /// Creates an amount, rounding to two fractional digits.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            return Ok(Amount::ZERO);
        }
        if value.is_sign_negative() {
            return Err(AmountError::Negative(value.to_string()));
        }
        let value = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        if value > Decimal::from(MAX_WHOLE) {
            return Err(AmountError::TooLarge(value.to_string()));
        }
        Ok(Self { value })
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Renders the amount for people: currency symbol, thousands separators, two decimals.
    pub fn formatted(&self, symbol: &str) -> String {
        format_money(self.value, symbol)
    }
}

/// Renders any decimal (including a negative balance) the way [`Amount::formatted`] does.
pub fn format_money(value: Decimal, symbol: &str) -> String {
    let sign = if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    };
    let num = value.abs().to_f64().unwrap_or_default();
    format!("{sign}{symbol}{}", format_num::format_num!(",.2", num))
}

/// An error that can occur when turning input into an `Amount`.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is required")]
    Empty,
    #[error("'{0}' is not a number")]
    Invalid(String),
    #[error("amount cannot be negative, got {0}")]
    Negative(String),
    #[error("amount {0} is larger than 999,999,999,999")]
    TooLarge(String),
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }

        let without_symbol = trimmed.trim_start_matches(CURRENCY_PREFIXES).trim_start();
        let without_commas = without_symbol.replace(',', "");

        let value = Decimal::from_str(&without_commas)
            .or_else(|_| Decimal::from_scientific(&without_commas))
            .map_err(|_| AmountError::Invalid(trimmed.to_string()))?;
        Amount::new(value)
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(AmountError::Invalid(value.to_string()));
        }
        let decimal =
            Decimal::from_f64(value).ok_or_else(|| AmountError::Invalid(value.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.normalize())
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Whole amounts are written as integers so stored data stays readable: `500`, not `500.0`.
        if self.value.fract().is_zero() {
            if let Some(whole) = self.value.to_u64() {
                return serializer.serialize_u64(whole);
            }
        }
        serializer.serialize_f64(self.value.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(AmountVisitor)
    }
}

/// Accepts both JSON numbers and numeric strings.
struct AmountVisitor;

impl Visitor<'_> for AmountVisitor {
    type Value = Amount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative number or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Amount, E> {
        Amount::new(Decimal::from(v)).map_err(E::custom)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Amount, E> {
        Amount::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Amount, E> {
        Amount::from_str(v).map_err(E::custom)
    }
}
