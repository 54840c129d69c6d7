//! Amount type for monetary values that may be stored either as strings or as numbers.
//!
//! Amounts entered through a form are stored as the text the user typed, while amounts that
//! arrive through an import may be JSON numbers. An `Amount` remembers which form it came from
//! so that a collection read from storage is written back exactly as it was found.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use tracing::warn;

/// How the amount was (or should be) written to JSON.
#[derive(Debug, Clone, PartialEq)]
enum Repr {
    /// A JSON string such as `"250.50"`.
    Text(String),
    /// A JSON number such as `250.5`.
    Number(serde_json::Number),
}

/// Represents a monetary amount.
///
/// The numeric value follows lenient float parsing: the longest leading numeric prefix of the
/// text is used and anything unparsable counts as zero. Representation is significant for
/// equality, so compare `value()` for numeric comparisons.
///
/// ```
/// # use finance_planner::model::Amount;
/// let typed: Amount = serde_json::from_str("\"250.50\"").unwrap();
/// let number: Amount = serde_json::from_str("250.5").unwrap();
/// assert_ne!(typed, number);
/// assert_eq!(typed.value(), number.value());
/// assert_eq!(serde_json::to_string(&typed).unwrap(), "\"250.50\"");
/// assert_eq!(serde_json::to_string(&number).unwrap(), "250.5");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the value was read from, or should be written to, JSON.
    repr: Repr,
}

impl Default for Amount {
    fn default() -> Self {
        Self {
            value: Decimal::ZERO,
            repr: Repr::Text(String::new()),
        }
    }
}

impl Amount {
    /// Creates a new amount that will be stored as text, the way form input is stored.
    pub fn new(value: Decimal) -> Self {
        Self {
            value,
            repr: Repr::Text(value.to_string()),
        }
    }

    /// Returns the numeric value. Unparsable text yields zero.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && !self.value.is_zero()
    }

    /// Returns true if the amount was stored as a JSON number.
    pub fn is_number(&self) -> bool {
        matches!(self.repr, Repr::Number(_))
    }
}

/// Parses the longest leading numeric prefix of `s`, ignoring leading whitespace. Returns `None`
/// when there is no numeric prefix at all.
///
/// `"250.50"` → 250.50, `"12abc"` → 12, `"1e3"` → 1000, `""` and `"abc"` → `None`.
pub fn parse_leading_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }
    let mantissa = s[..end].trim_start_matches('+').trim_end_matches('.');

    // Optional exponent, only taken when it is well formed.
    let mut exp_end = end;
    if exp_end < bytes.len() && (bytes[exp_end] == b'e' || bytes[exp_end] == b'E') {
        exp_end += 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            let exponent = &s[end + 1..exp_end];
            let scientific = format!("{mantissa}e{exponent}");
            return Decimal::from_scientific(&scientific).ok();
        }
    }

    let normalized = if mantissa.starts_with('.') || mantissa.starts_with("-.") {
        mantissa.replacen('.', "0.", 1)
    } else {
        mantissa.to_string()
    };
    Decimal::from_str(&normalized).ok()
}

/// Adds up `values`, clamping at `Decimal::MAX` or `Decimal::MIN` instead of overflowing.
/// Imported amounts are not range checked, so a total can exceed what a `Decimal` holds.
pub fn saturating_sum(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values.into_iter().fold(Decimal::ZERO, |total, value| {
        total.checked_add(value).unwrap_or_else(|| {
            warn!("The total of {total} and {value} is out of range, clamping it");
            if value.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        })
    })
}

/// Formats a value for display with thousands separators and two decimals, e.g. `₹55,000.00`.
pub fn format_money(value: Decimal, symbol: &str) -> String {
    let (sign, num) = if value.is_sign_negative() && !value.is_zero() {
        ("-", value.abs())
    } else {
        ("", value)
    };
    format!(
        "{sign}{symbol}{}",
        format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
    )
}

/// An error that can occur when parsing user input into an `Amount`.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

/// Strict parsing for user input: the whole (trimmed) string must be a decimal number. The text
/// is kept as typed.
impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = Decimal::from_str(trimmed).map_err(AmountError)?;
        Ok(Amount {
            value,
            repr: Repr::Text(trimmed.to_string()),
        })
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Text(s) => write!(f, "{s}"),
            Repr::Number(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.repr {
            Repr::Text(s) => serializer.serialize_str(s),
            Repr::Number(n) => n.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(Amount {
                value: parse_leading_decimal(&s).unwrap_or_default(),
                repr: Repr::Text(s),
            }),
            serde_json::Value::Number(n) => Ok(Amount {
                value: parse_leading_decimal(&n.to_string()).unwrap_or_default(),
                repr: Repr::Number(n),
            }),
            serde_json::Value::Null => Ok(Amount::default()),
            other => Err(serde::de::Error::custom(format!(
                "expected an amount as a string or number, found {other}"
            ))),
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
