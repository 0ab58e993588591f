//! Exact fixed-point token amounts
//!
//! On-chain token quantities are integers in base units with an implied
//! 18-digit fractional scale. [`FixedPointAmount`] converts between that
//! integer form and decimal strings without ever going through a float,
//! using alloy's unit conversions.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::utils::{format_units, parse_units};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Integer base-unit quantity with 18 implied fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPointAmount(U256);

impl FixedPointAmount {
    /// Number of implied fractional digits
    pub const DECIMALS: usize = 18;

    pub const ZERO: Self = Self(U256::ZERO);

    /// Wrap a raw base-unit integer
    pub const fn from_base_units(value: U256) -> Self {
        Self(value)
    }

    /// The raw base-unit integer
    pub const fn base_units(&self) -> U256 {
        self.0
    }

    /// Unit name understood by alloy's unit conversions for 18 decimals
    const UNIT: &'static str = "ether";

    /// Render as `<integer>.<fraction>`.
    ///
    /// Trailing fractional zeros are trimmed, but at least one fractional
    /// digit is always kept, so one whole token renders as `"1.0"`.
    pub fn to_decimal_string(&self) -> String {
        // Unsigned values always fit 18 decimals
        let full = format_units(self.0, Self::UNIT).unwrap_or_else(|_| self.0.to_string());
        match full.split_once('.') {
            Some((integer, fraction)) => {
                let trimmed = fraction.trim_end_matches('0');
                let fraction = if trimmed.is_empty() { "0" } else { trimmed };
                format!("{integer}.{fraction}")
            }
            None => format!("{full}.0"),
        }
    }

    /// Parse a decimal string back into base units.
    ///
    /// Accepts `"12"`, `"12.5"` and up to 18 fractional digits. Signs,
    /// exponents, separators and empty parts are rejected.
    pub fn from_decimal_str(value: &str) -> Result<Self> {
        let (integer, fraction) = match value.split_once('.') {
            Some((i, f)) => (i, f),
            None => (value, ""),
        };

        if integer.is_empty() || (value.contains('.') && fraction.is_empty()) {
            return Err(Error::InvalidAmount(format!("'{}' is not a decimal", value)));
        }
        if !integer.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(Error::InvalidAmount(format!(
                "'{}' contains non-digit characters",
                value
            )));
        }
        if fraction.len() > Self::DECIMALS {
            return Err(Error::InvalidAmount(format!(
                "'{}' has more than {} fractional digits",
                value,
                Self::DECIMALS
            )));
        }

        parse_units(value, Self::UNIT)
            .map(|units| Self(units.get_absolute()))
            .map_err(|e| Error::InvalidAmount(format!("'{}': {}", value, e)))
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl From<U256> for FixedPointAmount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl FromStr for FixedPointAmount {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_decimal_str(s)
    }
}

impl fmt::Display for FixedPointAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl Serialize for FixedPointAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_string())
    }
}

impl<'de> Deserialize<'de> for FixedPointAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_decimal_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Insert a `,` every three digits of the integer part of a decimal string.
///
/// The fractional part, if any, is passed through unmodified.
pub fn group_thousands(decimal: &str) -> String {
    let (integer, fraction) = match decimal.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (decimal, None),
    };

    let len = integer.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    match fraction {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}
