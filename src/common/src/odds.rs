//! Pari-mutuel odds and payout math.
//!
//! Pure functions over pool totals: winners split the whole pool
//! proportionally to their stake. No I/O, no internal state.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::BetSide;

/// Display odds for the two sides of a market, as integer percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolOdds {
    pub yes: u32,
    pub no: u32,
}

/// Derive display percentages from raw pool totals.
///
/// `yes` is `round(100 * yes_total / total)` (half away from zero) and the
/// NO side absorbs the rounding remainder, so the pair always sums to 100.
/// An empty pool reports 50/50 by policy: a market with no information has
/// no derived odds, but the display must still be deterministic.
///
/// Assumes validated non-negative inputs; never panics.
pub fn pool_odds(yes_total: Decimal, no_total: Decimal) -> PoolOdds {
    let total = yes_total + no_total;
    if total.is_zero() {
        return PoolOdds { yes: 50, no: 50 };
    }

    let yes = (Decimal::ONE_HUNDRED * yes_total / total)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
        .min(100);

    PoolOdds { yes, no: 100 - yes }
}

/// Proportional payout factor for a winning side: `total / side_total`.
///
/// A side with no stake yields `0`, the "no payout preview" signal for the
/// UI. That is a convention, not an error: a multiplier over an empty pool
/// is undefined.
pub fn payout_multiplier(yes_total: Decimal, no_total: Decimal, side: BetSide) -> Decimal {
    let side_total = match side {
        BetSide::Yes => yes_total,
        BetSide::No => no_total,
    };

    if side_total.is_zero() {
        return Decimal::ZERO;
    }

    (yes_total + no_total) / side_total
}

/// Payout for a winning stake: the stake's share of the full pool.
pub fn potential_payout(
    stake: Decimal,
    yes_total: Decimal,
    no_total: Decimal,
    side: BetSide,
) -> Decimal {
    let side_total = match side {
        BetSide::Yes => yes_total,
        BetSide::No => no_total,
    };

    if side_total.is_zero() {
        return Decimal::ZERO;
    }

    stake * (yes_total + no_total) / side_total
}
