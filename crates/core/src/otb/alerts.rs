//! Threshold-based alert rules.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::otb::types::{AlertSeverity, AlertType, CategorySummary, OtbAlert};

/// Percent thresholds for the alert rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertThresholds {
    /// `low_otb` fires when available is below this percent of planned.
    pub low_otb_percent: Decimal,
    /// `underutilized` fires when consumption is below this percent.
    pub underutilized_percent: Decimal,
    /// `category_imbalance` fires when planned deviates from the mean by more
    /// than this percent.
    pub imbalance_percent: Decimal,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self::from_percents(20, 50, 25)
    }
}

impl AlertThresholds {
    /// Builds thresholds from whole percents.
    #[must_use]
    pub fn from_percents(low_otb: u32, underutilized: u32, imbalance: u32) -> Self {
        Self {
            low_otb_percent: Decimal::from(low_otb),
            underutilized_percent: Decimal::from(underutilized),
            imbalance_percent: Decimal::from(imbalance),
        }
    }
}

/// Evaluates alert rules over category summaries.
pub struct AlertEngine;

impl AlertEngine {
    /// Returns every alert raised by `categories`.
    ///
    /// Categories without positive planned budget are skipped. Each category
    /// is checked against all four rules independently, so one category may
    /// raise several alerts. The imbalance mean is taken over categories
    /// with positive planned budget only.
    #[must_use]
    pub fn evaluate(
        season_id: Uuid,
        categories: &[CategorySummary],
        thresholds: &AlertThresholds,
    ) -> Vec<OtbAlert> {
        let funded: Vec<Decimal> = categories
            .iter()
            .map(|c| c.total_planned)
            .filter(|planned| *planned > Decimal::ZERO)
            .collect();
        let average_planned = if funded.is_empty() {
            Decimal::ZERO
        } else {
            funded.iter().copied().sum::<Decimal>() / Decimal::from(funded.len())
        };

        let mut alerts = Vec::new();
        for category in categories {
            if category.total_planned <= Decimal::ZERO {
                continue;
            }
            Self::evaluate_category(season_id, category, average_planned, thresholds, &mut alerts);
        }
        alerts
    }

    fn evaluate_category(
        season_id: Uuid,
        category: &CategorySummary,
        average_planned: Decimal,
        thresholds: &AlertThresholds,
        alerts: &mut Vec<OtbAlert>,
    ) {
        let name = category.category_name.as_deref().unwrap_or("Unknown");
        let planned = category.total_planned;
        let consumed = category.total_consumed;
        let available = category.total_available;
        let percentage = category.consumption_percentage;

        let alert = |alert_type, severity, message: String, current, threshold| OtbAlert {
            alert_type,
            severity,
            season_id,
            category_id: category.category_id,
            category_name: category.category_name.clone(),
            message,
            current_value: current,
            threshold_value: threshold,
        };

        let low_limit = planned * thresholds.low_otb_percent / Decimal::ONE_HUNDRED;
        if available < low_limit {
            alerts.push(alert(
                AlertType::LowOtb,
                AlertSeverity::Warning,
                format!(
                    "OTB for {name} is below {}% of plan, only {available:.2} remaining",
                    thresholds.low_otb_percent
                ),
                available,
                low_limit.round_dp(2),
            ));
        }

        if consumed > planned {
            alerts.push(alert(
                AlertType::OtbExceeded,
                AlertSeverity::Critical,
                format!("OTB for {name} exceeded! Consumed {consumed:.2} vs planned {planned:.2}"),
                consumed,
                planned,
            ));
        }

        if percentage < thresholds.underutilized_percent {
            alerts.push(alert(
                AlertType::Underutilized,
                AlertSeverity::Warning,
                format!("OTB for {name} is underutilized, only {percentage}% consumed"),
                percentage,
                thresholds.underutilized_percent,
            ));
        }

        if average_planned > Decimal::ZERO {
            let variance =
                (planned - average_planned).abs() / average_planned * Decimal::ONE_HUNDRED;
            if variance > thresholds.imbalance_percent {
                alerts.push(alert(
                    AlertType::CategoryImbalance,
                    AlertSeverity::Warning,
                    format!("Category {name} has {variance:.1}% variance from average OTB"),
                    planned,
                    average_planned.round_dp(2),
                ));
            }
        }
    }
}
