//! Derived metrics shared by the dashboard, consumption and alert views.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Consumed as a percent of planned, rounded to 2 dp. Zero when planned is
/// not positive.
#[must_use]
pub fn consumption_percentage(consumed: Decimal, planned: Decimal) -> Decimal {
    if planned <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (consumed / planned * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Projects the day a category's remaining budget runs out.
///
/// The spend rate is `consumed` spread evenly over the days from `epoch` to
/// `today` (at least one day). Returns `None` when nothing has been consumed
/// or nothing is left.
#[must_use]
pub fn project_exhaustion(
    consumed: Decimal,
    available: Decimal,
    epoch: NaiveDate,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if consumed <= Decimal::ZERO || available <= Decimal::ZERO {
        return None;
    }

    let days_elapsed = (today - epoch).num_days().max(1);
    let daily_rate = consumed / Decimal::from(days_elapsed);
    if daily_rate <= Decimal::ZERO {
        return None;
    }

    let days_remaining = (available / daily_rate).trunc().to_i64()?;
    today.checked_add_signed(Duration::try_days(days_remaining)?)
}
