//! Weighted allocation using the Largest Remainder Method.
//!
//! An approved adjustment moves an amount in or out of a category as a whole,
//! while positions are stored per month. The net amount is split across the
//! category's months so that the parts sum exactly to the whole.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Splits `total` across `weights` at `decimal_places` precision.
///
/// Shares are proportional to the weights; non-positive weights count as
/// zero, and if no weight is positive the split is even. The returned shares
/// always sum to `total` rounded to `decimal_places`. Negative totals are
/// split by magnitude and negated.
///
/// ```
/// use rust_decimal_macros::dec;
/// use stockplan_core::otb::allocate_by_weights;
///
/// let shares = allocate_by_weights(dec!(100), &[dec!(1), dec!(1), dec!(1)], 2);
/// assert_eq!(shares, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
/// ```
#[must_use]
pub fn allocate_by_weights(total: Decimal, weights: &[Decimal], decimal_places: u32) -> Vec<Decimal> {
    if weights.is_empty() {
        return vec![];
    }

    let total_rounded =
        total.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven);
    if total_rounded.is_sign_negative() {
        return allocate_by_weights(-total_rounded, weights, decimal_places)
            .into_iter()
            .map(|share| -share)
            .collect();
    }

    let unit = Decimal::new(1, decimal_places);
    let clamped: Vec<Decimal> = weights.iter().map(|w| (*w).max(Decimal::ZERO)).collect();
    let weight_sum: Decimal = clamped.iter().copied().sum();
    let clamped = if weight_sum > Decimal::ZERO {
        clamped
    } else {
        vec![Decimal::ONE; weights.len()]
    };
    let weight_sum: Decimal = clamped.iter().copied().sum();

    // Exact shares, then round each down
    let exact: Vec<Decimal> = clamped
        .iter()
        .map(|w| total_rounded * *w / weight_sum)
        .collect();
    let mut rounded: Vec<Decimal> = exact
        .iter()
        .map(|a| a.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero))
        .collect();

    let sum_rounded: Decimal = rounded.iter().copied().sum();
    let units_to_distribute = ((total_rounded - sum_rounded) / unit)
        .round_dp_with_strategy(0, RoundingStrategy::ToZero)
        .to_usize()
        .unwrap_or(0);

    if units_to_distribute == 0 {
        return rounded;
    }

    // Largest fractional remainder first; ties go to the earlier item
    let mut remainders: Vec<(usize, Decimal)> = exact
        .iter()
        .zip(rounded.iter())
        .enumerate()
        .map(|(i, (e, r))| (i, *e - *r))
        .collect();
    remainders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (idx, _) in remainders.iter().take(units_to_distribute) {
        rounded[*idx] += unit;
    }

    rounded
}
