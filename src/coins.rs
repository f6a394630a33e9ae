//! Per-denomination coin counts and the arithmetic between them.

use crate::denomination::DENOMINATIONS;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Sub;
use thiserror::Error;

const SLOTS: usize = DENOMINATIONS.len();

/// A coin value that is not in [`DENOMINATIONS`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{0} is not a known denomination")]
pub struct UnknownDenomination(pub u32);

/// Count held of every denomination in the fixed table.
///
/// Every denomination is always present (default 0) and no other key can
/// exist, so two mappings can be combined slot by slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CoinQuantities([u32; SLOTS]);

impl CoinQuantities {
    /// All counts zero.
    pub const EMPTY: Self = CoinQuantities([0; SLOTS]);

    /// Counts aligned with [`DENOMINATIONS`].
    pub fn from_counts(counts: [u32; SLOTS]) -> Self {
        CoinQuantities(counts)
    }

    /// Tallies a flat coin list.
    pub fn from_coins(coins: &[u32]) -> Result<Self, UnknownDenomination> {
        let mut counts = [0; SLOTS];
        for &coin in coins {
            counts[slot(coin)?] += 1;
        }
        Ok(CoinQuantities(counts))
    }

    /// Builds a mapping from `(denomination, count)` pairs, summing repeats.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, UnknownDenomination>
    where
        I: IntoIterator<Item = (u32, u32)>,
    {
        let mut counts = [0; SLOTS];
        for (coin, count) in pairs {
            counts[slot(coin)?] += count;
        }
        Ok(CoinQuantities(counts))
    }

    /// Expands back to a flat coin list, largest first.
    pub fn to_coins(&self) -> Vec<u32> {
        self.iter()
            .flat_map(|(coin, count)| std::iter::repeat(coin).take(count as usize))
            .collect()
    }

    /// Counts aligned with [`DENOMINATIONS`].
    pub fn counts(&self) -> [u32; SLOTS] {
        self.0
    }

    pub fn get(&self, coin: u32) -> Option<u32> {
        slot(coin).ok().map(|i| self.0[i])
    }

    /// `(denomination, count)` for every denomination, largest first.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        DENOMINATIONS.iter().copied().zip(self.0.iter().copied())
    }

    /// Value of all coins in sub-units.
    pub fn sub_unit_total(&self) -> u64 {
        self.iter()
            .map(|(coin, count)| u64::from(coin) * u64::from(count))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&count| count == 0)
    }

    /// Element-wise sum, `None` on overflow.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        let mut counts = [0; SLOTS];
        for (i, count) in counts.iter_mut().enumerate() {
            *count = self.0[i].checked_add(other.0[i])?;
        }
        Some(CoinQuantities(counts))
    }

    /// Element-wise difference, `None` if any count would go negative.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        let mut counts = [0; SLOTS];
        for (i, count) in counts.iter_mut().enumerate() {
            *count = self.0[i].checked_sub(other.0[i])?;
        }
        Some(CoinQuantities(counts))
    }
}

fn slot(coin: u32) -> Result<usize, UnknownDenomination> {
    DENOMINATIONS
        .iter()
        .position(|&d| d == coin)
        .ok_or(UnknownDenomination(coin))
}

impl Sub for CoinQuantities {
    type Output = Self;

    /// # Panics
    ///
    /// Panics if any count would become negative. Removing coins that are not
    /// held is a logic error in the caller, never a condition to clamp.
    fn sub(self, rhs: Self) -> Self::Output {
        match self.checked_sub(&rhs) {
            Some(result) => result,
            None => panic!("coin quantity underflow: {} - {}", self, rhs),
        }
    }
}

impl fmt::Display for CoinQuantities {
    /// Non-zero counts as `50x1 20x2`, or `-` when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held: Vec<String> = self
            .iter()
            .filter(|&(_, count)| count > 0)
            .map(|(coin, count)| format!("{}x{}", coin, count))
            .collect();
        if held.is_empty() {
            write!(f, "-")
        } else {
            write!(f, "{}", held.join(" "))
        }
    }
}

impl Serialize for CoinQuantities {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let map: BTreeMap<u32, u32> = self.iter().collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CoinQuantities {
    /// Missing denominations read as zero; unknown ones are rejected.
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = BTreeMap::<u32, u32>::deserialize(deserializer)?;
        CoinQuantities::from_pairs(map).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coins_tallies() {
        let q = CoinQuantities::from_coins(&[50, 50, 50, 20]).unwrap();
        assert_eq!(q.counts(), [3, 1, 0, 0, 0, 0]);

        let q = CoinQuantities::from_coins(&[50, 50, 50, 20, 10]).unwrap();
        assert_eq!(q.counts(), [3, 1, 1, 0, 0, 0]);
        assert_eq!(q.get(10), Some(1));
        assert_eq!(q.get(3), None);
    }

    #[test]
    fn test_from_coins_rejects_unknown_denomination() {
        assert_eq!(
            CoinQuantities::from_coins(&[20, 25]),
            Err(UnknownDenomination(25))
        );
    }

    #[test]
    fn test_to_coins_then_tally_is_identity() {
        let mappings = [
            CoinQuantities::EMPTY,
            CoinQuantities::from_counts([1, 0, 2, 0, 3, 0]),
            CoinQuantities::from_counts([0, 4, 0, 1, 0, 9]),
        ];
        for q in mappings {
            assert_eq!(CoinQuantities::from_coins(&q.to_coins()).unwrap(), q);
        }
    }

    #[test]
    fn test_totals() {
        let q = CoinQuantities::from_counts([3, 1, 0, 0, 1, 1]);
        assert_eq!(q.sub_unit_total(), 173);
        assert!(!q.is_empty());
        assert!(CoinQuantities::EMPTY.is_empty());
    }

    #[test]
    fn test_add_and_subtract() {
        let a = CoinQuantities::from_counts([1, 2, 0, 0, 0, 1]);
        let b = CoinQuantities::from_counts([0, 1, 1, 0, 0, 0]);

        let sum = a.checked_add(&b).unwrap();
        assert_eq!(sum.counts(), [1, 3, 1, 0, 0, 1]);
        assert_eq!(sum - b, a);
        assert_eq!(a.checked_sub(&b), None);
    }

    #[test]
    fn test_add_overflow_is_detected() {
        let a = CoinQuantities::from_counts([u32::MAX, 0, 0, 0, 0, 0]);
        let b = CoinQuantities::from_counts([1, 0, 0, 0, 0, 0]);
        assert_eq!(a.checked_add(&b), None);
    }

    #[test]
    #[should_panic(expected = "coin quantity underflow")]
    fn test_subtract_below_zero_panics() {
        let held = CoinQuantities::from_counts([0, 0, 1, 0, 0, 0]);
        let removed = CoinQuantities::from_counts([0, 0, 0, 1, 0, 0]);
        let _ = held - removed;
    }

    #[test]
    fn test_display() {
        let q = CoinQuantities::from_counts([0, 1, 1, 0, 0, 0]);
        assert_eq!(q.to_string(), "20x1 10x1");
        assert_eq!(CoinQuantities::EMPTY.to_string(), "-");
    }

    #[test]
    fn test_serde_fills_missing_and_rejects_unknown() {
        let q: CoinQuantities = serde_json::from_str(r#"{"20":1,"10":2}"#).unwrap();
        assert_eq!(q.counts(), [0, 1, 2, 0, 0, 0]);

        assert!(serde_json::from_str::<CoinQuantities>(r#"{"25":1}"#).is_err());

        let json = serde_json::to_string(&q).unwrap();
        assert_eq!(json, r#"{"1":0,"2":0,"5":0,"10":2,"20":1,"50":0}"#);
    }
}
