//! Exact decomposition of monetary values into whole units and sub-units.
//!
//! Amounts are parsed with `rust_decimal` and split into an integer whole-unit
//! part and a sub-unit remainder at a fixed scale of two decimal digits.
//! Precision finer than one sub-unit is truncated toward zero, never rounded:
//! `10.239` decomposes to `(10, 23)`.

use crate::denomination::{SUB_UNITS_PER_WHOLE, SUB_UNIT_SCALE};
use crate::error::AmountError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A non-negative monetary value as `(whole_units, sub_units)`.
///
/// `sub_units` is always below [`SUB_UNITS_PER_WHOLE`].
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use coin_wallet::Amount;
///
/// let amount = Amount::from_str("50.05").unwrap();
/// assert_eq!(amount.whole_units(), 50);
/// assert_eq!(amount.sub_units(), 5);
/// assert_eq!(amount.to_string(), "50.05");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    whole_units: u64,
    sub_units: u32,
}

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount {
        whole_units: 0,
        sub_units: 0,
    };

    /// Creates an amount from its parts.
    pub fn new(whole_units: u64, sub_units: u32) -> Result<Self, AmountError> {
        if sub_units >= SUB_UNITS_PER_WHOLE {
            return Err(AmountError::SubUnitsOutOfRange(sub_units));
        }
        Ok(Amount {
            whole_units,
            sub_units,
        })
    }

    /// Creates a whole-unit amount with no sub-unit part.
    pub fn whole(whole_units: u64) -> Self {
        Amount {
            whole_units,
            sub_units: 0,
        }
    }

    /// Decomposes a decimal value, truncating anything below one sub-unit.
    pub fn from_decimal(value: Decimal) -> Result<Self, AmountError> {
        if value.is_zero() {
            return Ok(Amount::ZERO);
        }
        if value.is_sign_negative() {
            return Err(AmountError::Negative);
        }

        let whole = value.trunc();
        let whole_units = whole.to_u64().ok_or(AmountError::Overflow)?;
        let sub_units = ((value - whole) * Decimal::from(SUB_UNITS_PER_WHOLE))
            .trunc()
            .to_u32()
            .ok_or(AmountError::Overflow)?;

        Amount::new(whole_units, sub_units)
    }

    /// Recombines the parts into a decimal at the sub-unit scale.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.whole_units) + Decimal::new(i64::from(self.sub_units), SUB_UNIT_SCALE)
    }

    pub fn whole_units(&self) -> u64 {
        self.whole_units
    }

    pub fn sub_units(&self) -> u32 {
        self.sub_units
    }

    /// Returns `true` if both parts are zero.
    pub fn is_zero(&self) -> bool {
        self.whole_units == 0 && self.sub_units == 0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())?;
        Amount::from_decimal(decimal)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.whole_units, self.sub_units)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}
