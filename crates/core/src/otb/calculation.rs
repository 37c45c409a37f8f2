//! Bucket arithmetic: plan + adjustments - consumption.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::otb::allocation::allocate_by_weights;
use crate::otb::types::{AdjustmentTotals, BucketKey, BucketTotals, PositionUpsert};

/// Adds `amount` to the bucket for `category_id` and the month of `date`.
pub fn accumulate(
    totals: &mut BucketTotals,
    category_id: Option<Uuid>,
    date: NaiveDate,
    amount: Decimal,
) {
    *totals.entry(BucketKey::new(category_id, date)).or_default() += amount;
}

/// Stateless calculator for OTB positions.
pub struct OtbCalculator;

impl OtbCalculator {
    /// Computes the positions to write for a season.
    ///
    /// One position is produced for every bucket present in `planned`;
    /// buckets that only have consumption are skipped. A category's net
    /// approved adjustment is spread across its months in proportion to
    /// their planned amounts, so the category total moves by exactly the
    /// adjustment. `available` is clamped at zero.
    ///
    /// The result is ordered by category, then month.
    #[must_use]
    pub fn compute(
        season_id: Uuid,
        planned: &BucketTotals,
        consumed: &BucketTotals,
        adjustments: &AdjustmentTotals,
    ) -> Vec<PositionUpsert> {
        let mut by_category: BTreeMap<Option<Uuid>, Vec<(BucketKey, Decimal)>> = BTreeMap::new();
        for (key, amount) in planned {
            by_category
                .entry(key.category_id)
                .or_default()
                .push((*key, *amount));
        }

        let mut positions = Vec::with_capacity(planned.len());
        for (category_id, buckets) in by_category {
            let net = category_id.map_or(Decimal::ZERO, |id| adjustments.net_for(id));
            let shares = if net.is_zero() {
                vec![Decimal::ZERO; buckets.len()]
            } else {
                let weights: Vec<Decimal> = buckets.iter().map(|(_, amount)| *amount).collect();
                allocate_by_weights(net, &weights, 2)
            };

            for ((key, planned_amount), share) in buckets.into_iter().zip(shares) {
                let effective_planned = planned_amount + share;
                let consumed_amount = consumed.get(&key).copied().unwrap_or(Decimal::ZERO);
                let available = (effective_planned - consumed_amount).max(Decimal::ZERO);

                positions.push(PositionUpsert {
                    season_id,
                    key,
                    planned_otb: effective_planned,
                    consumed_otb: consumed_amount,
                    available_otb: available,
                });
            }
        }

        positions
    }
}
