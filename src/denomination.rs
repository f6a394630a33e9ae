//! The fixed coin table and minimum-coin selection.
//!
//! Both solvers try every position `k` of the descending denomination list
//! as a starting point and scan forward greedily from there, keeping the
//! exact-sum candidate with the fewest coins. Ties keep the smallest `k`,
//! i.e. the candidate led by the largest denomination.
//!
//! # Limitation
//!
//! Per-offset greedy is optimal for canonical coin systems such as
//! [`DENOMINATIONS`], where greedy from any prefix is optimal. It is not a
//! general change-making solver: for a table like `[10, 5, 4]` and a target
//! of 18 it finds nothing even though `10 + 4 + 4` exists. Tables are not
//! configurable for that reason.

use thiserror::Error;

/// Coin values in sub-units, largest first.
pub const DENOMINATIONS: [u32; 6] = [50, 20, 10, 5, 2, 1];

/// Sub-units in one whole unit.
pub const SUB_UNITS_PER_WHOLE: u32 = 100;

/// Decimal digits of the sub-unit part.
pub const SUB_UNIT_SCALE: u32 = 2;

/// No candidate scan reached the target exactly.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("no exact combination of coins adds up to {target}")]
pub struct NoExactCombination {
    pub target: u32,
}

/// Minimum-cardinality coin list from a limited supply.
///
/// `available[i]` is the count held of `denominations[i]`. The inputs need
/// not be sorted; the returned coins are in descending order.
pub fn solve_bounded(
    denominations: &[u32],
    available: &[u32],
    target: u32,
) -> Result<Vec<u32>, NoExactCombination> {
    debug_assert_eq!(denominations.len(), available.len());

    let supply: Vec<(u32, Option<u32>)> = denominations
        .iter()
        .zip(available)
        .map(|(&coin, &count)| (coin, Some(count)))
        .collect();

    best_candidate(supply, target)
}

/// Minimum-cardinality coin list with unlimited supply of every coin.
///
/// Always succeeds for tables containing a unit coin.
pub fn solve_unbounded(denominations: &[u32], target: u32) -> Result<Vec<u32>, NoExactCombination> {
    let supply: Vec<(u32, Option<u32>)> = denominations.iter().map(|&coin| (coin, None)).collect();

    best_candidate(supply, target)
}

fn best_candidate(
    mut supply: Vec<(u32, Option<u32>)>,
    target: u32,
) -> Result<Vec<u32>, NoExactCombination> {
    supply.retain(|&(coin, _)| coin > 0);
    supply.sort_by(|a, b| b.0.cmp(&a.0));

    if target == 0 {
        return Ok(Vec::new());
    }

    let mut best: Option<Vec<u32>> = None;
    for start in 0..supply.len() {
        if let Some(candidate) = greedy_from(&supply[start..], target) {
            let better = best
                .as_ref()
                .map_or(true, |current| candidate.len() < current.len());
            if better {
                best = Some(candidate);
            }
        }
    }

    best.ok_or(NoExactCombination { target })
}

/// One forward greedy scan. `None` supply is unlimited.
fn greedy_from(supply: &[(u32, Option<u32>)], target: u32) -> Option<Vec<u32>> {
    let mut coins = Vec::new();
    let mut remaining = target;

    for &(coin, available) in supply {
        if remaining == 0 {
            break;
        }
        let fits = remaining / coin;
        let take = match available {
            Some(count) => fits.min(count),
            None => fits,
        };
        if take == 0 {
            continue;
        }
        coins.extend(std::iter::repeat(coin).take(take as usize));
        remaining -= coin * take;
    }

    (remaining == 0).then_some(coins)
}
