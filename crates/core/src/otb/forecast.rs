//! Naive linear forecast of remaining OTB.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::otb::types::{ForecastTrend, MonthForecast, MonthTotals, first_of_month};

/// Projects consumption for the current and future months.
pub struct Forecaster;

impl Forecaster {
    /// Builds the forecast from per-month totals ordered by month.
    ///
    /// Every month at or after the month of `today` is projected to consume
    /// the average consumption of the months before it (zero if there are
    /// none). The running remainder starts at the season's total available
    /// and is reduced by that average once per projected month.
    #[must_use]
    pub fn project(season_id: Uuid, months: &[MonthTotals], today: NaiveDate) -> Vec<MonthForecast> {
        let current_month = first_of_month(today);

        let past: Vec<&MonthTotals> = months.iter().filter(|m| m.month < current_month).collect();
        let past_consumed: Decimal = past.iter().map(|m| m.consumed_otb).sum();
        let average = past_consumed / Decimal::from(past.len().max(1));

        let mut running_remaining: Decimal = months.iter().map(|m| m.available_otb).sum();

        months
            .iter()
            .filter(|m| m.month >= current_month)
            .map(|m| {
                running_remaining -= average;
                MonthForecast {
                    season_id,
                    month: m.month,
                    projected_consumption: average.round_dp(2),
                    projected_remaining: running_remaining.max(Decimal::ZERO).round_dp(2),
                    trend: Self::trend(average, m.planned_otb),
                }
            })
            .collect()
    }

    fn trend(average: Decimal, planned: Decimal) -> ForecastTrend {
        let high = planned * Decimal::new(8, 1);
        let low = planned * Decimal::new(3, 1);
        if average > high {
            ForecastTrend::Increasing
        } else if average < low {
            ForecastTrend::Decreasing
        } else {
            ForecastTrend::Stable
        }
    }
}
