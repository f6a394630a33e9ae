//! The persisted balance of the wallet.
//!
//! Maintains the invariant: `total == whole_units + coin value / 100`. The
//! total is always derived, never stored as a source of truth.

use crate::coins::CoinQuantities;
use crate::denomination::{SUB_UNITS_PER_WHOLE, SUB_UNIT_SCALE};
use crate::error::StoreError;
use rust_decimal::Decimal;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// Whole units plus the coins that make up the fractional part.
///
/// The coin value may exceed one whole unit (three 50s are 1.50); coins are
/// never exchanged for whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct BalanceSnapshot {
    /// Whole units held.
    pub whole_units: u64,

    /// Coins held.
    #[serde(default)]
    pub coins: CoinQuantities,
}

impl BalanceSnapshot {
    /// The balance before anything has been credited.
    pub fn zero() -> Self {
        BalanceSnapshot::default()
    }

    pub fn new(whole_units: u64, coins: CoinQuantities) -> Self {
        BalanceSnapshot { whole_units, coins }
    }

    /// Total value: whole units plus the coin value.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.whole_units)
            + Decimal::from(self.coins.sub_unit_total()) / Decimal::from(SUB_UNITS_PER_WHOLE)
    }

    /// Decodes stored bytes. Absent and empty values are the zero snapshot.
    pub fn decode(bytes: Option<&[u8]>) -> Result<Self, StoreError> {
        match bytes {
            None => Ok(BalanceSnapshot::zero()),
            Some(b) if b.iter().all(u8::is_ascii_whitespace) => Ok(BalanceSnapshot::zero()),
            Some(b) => Ok(serde_json::from_slice(b)?),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Serialize for BalanceSnapshot {
    /// Writes the derived `total` alongside the fields for readers of the
    /// store; decoding ignores it.
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut total = self.total();
        total.rescale(SUB_UNIT_SCALE);

        let mut state = serializer.serialize_struct("BalanceSnapshot", 3)?;
        state.serialize_field("whole_units", &self.whole_units)?;
        state.serialize_field("coins", &self.coins)?;
        state.serialize_field("total", &total.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_zero_snapshot() {
        let snapshot = BalanceSnapshot::zero();
        assert_eq!(snapshot.whole_units, 0);
        assert!(snapshot.coins.is_empty());
        assert_eq!(snapshot.total(), Decimal::ZERO);
    }

    #[test]
    fn test_total_is_derived() {
        let snapshot = BalanceSnapshot::new(10, CoinQuantities::from_counts([0, 1, 1, 0, 0, 0]));
        assert_eq!(snapshot.total(), dec("10.30"));

        let snapshot = BalanceSnapshot::new(1, CoinQuantities::from_counts([3, 0, 0, 0, 0, 0]));
        assert_eq!(snapshot.total(), dec("2.50"));
    }

    #[test]
    fn test_absent_or_empty_decodes_to_zero() {
        assert_eq!(BalanceSnapshot::decode(None).unwrap(), BalanceSnapshot::zero());
        assert_eq!(BalanceSnapshot::decode(Some(b"")).unwrap(), BalanceSnapshot::zero());
        assert_eq!(BalanceSnapshot::decode(Some(b"  \n")).unwrap(), BalanceSnapshot::zero());
    }

    #[test]
    fn test_corrupt_bytes_are_a_codec_error() {
        let err = BalanceSnapshot::decode(Some(b"{not json")).unwrap_err();
        assert!(matches!(err, StoreError::Codec(_)));
    }

    #[test]
    fn test_encoding_carries_total_and_decodes_back() {
        let snapshot = BalanceSnapshot::new(1, CoinQuantities::from_counts([0, 1, 0, 0, 1, 1]));
        let bytes = snapshot.encode().unwrap();

        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains(r#""whole_units":1"#));
        assert!(text.contains(r#""total":"1.23""#));

        assert_eq!(BalanceSnapshot::decode(Some(&bytes)).unwrap(), snapshot);
    }

    #[test]
    fn test_stale_total_is_ignored_on_decode() {
        let bytes = br#"{"whole_units":5,"coins":{"10":1},"total":"999.00"}"#;
        let snapshot = BalanceSnapshot::decode(Some(bytes)).unwrap();
        assert_eq!(snapshot.total(), dec("5.10"));
    }
}
