//! OTB domain types.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::otb::metrics::consumption_percentage;

/// Returns the first day of the month containing `date`.
#[must_use]
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// A (category, month) pair, the unit of aggregation.
///
/// `category_id = None` is the uncategorized bucket. `month` is always the
/// first day of its month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    /// Category, or `None` for uncategorized spend.
    pub category_id: Option<Uuid>,
    /// First day of the month.
    pub month: NaiveDate,
}

impl BucketKey {
    /// Creates a key, normalizing `date` to the first of its month.
    #[must_use]
    pub fn new(category_id: Option<Uuid>, date: NaiveDate) -> Self {
        Self {
            category_id,
            month: first_of_month(date),
        }
    }
}

/// Summed amounts per bucket.
pub type BucketTotals = BTreeMap<BucketKey, Decimal>;

/// Approved adjustment amounts grouped by source and by destination category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentTotals {
    /// Sum of approved amounts moved out of each category.
    pub outgoing: BTreeMap<Uuid, Decimal>,
    /// Sum of approved amounts moved into each category.
    pub incoming: BTreeMap<Uuid, Decimal>,
}

impl AdjustmentTotals {
    /// Net change to a category's planned budget (incoming minus outgoing).
    #[must_use]
    pub fn net_for(&self, category_id: Uuid) -> Decimal {
        let incoming = self
            .incoming
            .get(&category_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        let outgoing = self
            .outgoing
            .get(&category_id)
            .copied()
            .unwrap_or(Decimal::ZERO);
        incoming - outgoing
    }

    /// Adds an approved adjustment to the totals.
    pub fn add(&mut self, from: Option<Uuid>, to: Option<Uuid>, amount: Decimal) {
        if let Some(from) = from {
            *self.outgoing.entry(from).or_default() += amount;
        }
        if let Some(to) = to {
            *self.incoming.entry(to).or_default() += amount;
        }
    }
}

// ============================================================================
// Seasons and purchase orders
// ============================================================================

/// Season workflow status. `Locked` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonStatus {
    /// Season created.
    Created,
    /// Store locations assigned.
    LocationsDefined,
    /// Sales plan uploaded.
    PlanUploaded,
    /// OTB plan uploaded.
    OtbUploaded,
    /// Range intent uploaded.
    RangeUploaded,
    /// Read-only.
    Locked,
}

impl SeasonStatus {
    /// Returns true if the season no longer accepts mutations.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// The parts of a season the engine needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonInfo {
    /// Season ID.
    pub id: Uuid,
    /// Owning company, if any.
    pub company_id: Option<Uuid>,
    /// Display name.
    pub name: String,
    /// First day of the season.
    pub start_date: NaiveDate,
    /// Last day of the season.
    pub end_date: NaiveDate,
    /// Workflow status.
    pub status: SeasonStatus,
}

/// Purchase order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    /// Being drafted.
    Draft,
    /// Sent to supplier.
    Submitted,
    /// Confirmed by supplier.
    Confirmed,
    /// In transit.
    Shipped,
    /// Partially received.
    Partial,
    /// Fully received.
    Complete,
    /// Cancelled.
    Cancelled,
}

impl PurchaseOrderStatus {
    /// Returns true if orders in this status commit OTB.
    #[must_use]
    pub const fn counts_toward_consumption(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

// ============================================================================
// Positions
// ============================================================================

/// Materialized OTB state of one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtbPosition {
    /// Position ID.
    pub id: Uuid,
    /// Season ID.
    pub season_id: Uuid,
    /// Category, or `None` for uncategorized.
    pub category_id: Option<Uuid>,
    /// First day of the month.
    pub month: NaiveDate,
    /// Planned budget after approved adjustments.
    pub planned_otb: Decimal,
    /// Committed spend from active purchase orders.
    pub consumed_otb: Decimal,
    /// `max(planned_otb - consumed_otb, 0)`.
    pub available_otb: Decimal,
    /// When the position was last recalculated.
    pub last_calculated: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl OtbPosition {
    /// Consumed as a percent of planned, 2 dp.
    #[must_use]
    pub fn consumption_percentage(&self) -> Decimal {
        consumption_percentage(self.consumed_otb, self.planned_otb)
    }

    /// Available is under `low_otb_percent` of planned.
    #[must_use]
    pub fn is_low(&self, low_otb_percent: Decimal) -> bool {
        self.planned_otb > Decimal::ZERO
            && self.available_otb < self.planned_otb * low_otb_percent / Decimal::ONE_HUNDRED
    }

    /// Consumed is over planned.
    #[must_use]
    pub fn is_exceeded(&self) -> bool {
        self.consumed_otb > self.planned_otb
    }
}

/// A position as returned to clients, with its derived flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    /// Stored position.
    #[serde(flatten)]
    pub position: OtbPosition,
    /// Consumed as a percent of planned, 2 dp.
    pub consumption_percentage: Decimal,
    /// Available is under the season's low OTB threshold.
    pub is_low: bool,
    /// Consumed is over planned.
    pub is_exceeded: bool,
}

impl PositionView {
    /// Derives the flags, using the same low threshold as the `low_otb` alert.
    #[must_use]
    pub fn new(position: OtbPosition, low_otb_percent: Decimal) -> Self {
        Self {
            consumption_percentage: position.consumption_percentage(),
            is_low: position.is_low(low_otb_percent),
            is_exceeded: position.is_exceeded(),
            position,
        }
    }
}

/// Computed values to write for one bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionUpsert {
    /// Season ID.
    pub season_id: Uuid,
    /// Bucket being written.
    pub key: BucketKey,
    /// Planned budget after approved adjustments.
    pub planned_otb: Decimal,
    /// Committed spend.
    pub consumed_otb: Decimal,
    /// Remaining budget, never negative.
    pub available_otb: Decimal,
}

/// Grand totals over a season's positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtbTotals {
    /// Sum of planned.
    pub total_planned: Decimal,
    /// Sum of consumed.
    pub total_consumed: Decimal,
    /// Sum of available.
    pub total_available: Decimal,
}

/// Position totals for one category across all months.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    /// Category, or `None` for uncategorized.
    pub category_id: Option<Uuid>,
    /// Sum of planned.
    pub total_planned: Decimal,
    /// Sum of consumed.
    pub total_consumed: Decimal,
    /// Sum of available.
    pub total_available: Decimal,
}

/// Position totals for one month across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTotals {
    /// First day of the month.
    pub month: NaiveDate,
    /// Sum of planned.
    pub planned_otb: Decimal,
    /// Sum of consumed.
    pub consumed_otb: Decimal,
    /// Sum of available.
    pub available_otb: Decimal,
}

// ============================================================================
// Views
// ============================================================================

/// Dashboard row for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Category, or `None` for uncategorized.
    pub category_id: Option<Uuid>,
    /// Display name, when the category is known.
    pub category_name: Option<String>,
    /// Sum of planned.
    pub total_planned: Decimal,
    /// Sum of consumed.
    pub total_consumed: Decimal,
    /// Sum of available.
    pub total_available: Decimal,
    /// Consumed as a percent of planned.
    pub consumption_percentage: Decimal,
}

/// Dashboard row for a month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSummary {
    /// First day of the month.
    pub month: NaiveDate,
    /// Sum of planned.
    pub planned_otb: Decimal,
    /// Sum of consumed.
    pub consumed_otb: Decimal,
    /// Sum of available.
    pub available_otb: Decimal,
    /// Consumed as a percent of planned.
    pub consumption_percentage: Decimal,
}

/// Season-wide OTB dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtbDashboard {
    /// Season ID.
    pub season_id: Uuid,
    /// Sum of planned.
    pub total_planned: Decimal,
    /// Sum of consumed.
    pub total_consumed: Decimal,
    /// Sum of available.
    pub total_available: Decimal,
    /// Consumed as a percent of planned.
    pub consumption_percentage: Decimal,
    /// Per-category rows.
    pub by_category: Vec<CategorySummary>,
    /// Per-month rows, ordered by month.
    pub by_month: Vec<MonthSummary>,
}

/// Consumption detail for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConsumption {
    /// Season ID.
    pub season_id: Uuid,
    /// Category, or `None` for uncategorized.
    pub category_id: Option<Uuid>,
    /// Display name, when the category is known.
    pub category_name: Option<String>,
    /// Planned budget after adjustments.
    pub planned_otb: Decimal,
    /// Value of active purchase orders.
    pub total_po_value: Decimal,
    /// Committed spend.
    pub consumed_otb: Decimal,
    /// Remaining budget.
    pub available_otb: Decimal,
    /// Consumed as a percent of planned.
    pub consumption_percentage: Decimal,
    /// Day the remaining budget runs out at the current spend rate.
    pub projected_exhaustion_date: Option<NaiveDate>,
}

/// Direction of projected spend relative to plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForecastTrend {
    /// Spend runs above 80% of plan.
    Increasing,
    /// Spend runs below 30% of plan.
    Decreasing,
    /// Anything in between.
    Stable,
}

/// Projection for one current or future month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthForecast {
    /// Season ID.
    pub season_id: Uuid,
    /// First day of the month.
    pub month: NaiveDate,
    /// Expected spend in the month.
    pub projected_consumption: Decimal,
    /// Budget left after the month, never negative.
    pub projected_remaining: Decimal,
    /// Trend classification.
    pub trend: ForecastTrend,
}

/// Kind of alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    /// Available budget is running low.
    LowOtb,
    /// Consumed more than planned.
    OtbExceeded,
    /// Too little of the plan has been committed.
    Underutilized,
    /// Planned budget is far from the category average.
    CategoryImbalance,
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// Needs attention.
    Warning,
    /// Budget already breached.
    Critical,
}

/// A threshold violation for a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtbAlert {
    /// Kind of alert.
    pub alert_type: AlertType,
    /// Severity.
    pub severity: AlertSeverity,
    /// Season ID.
    pub season_id: Uuid,
    /// Category, or `None` for uncategorized.
    pub category_id: Option<Uuid>,
    /// Display name, when the category is known.
    pub category_name: Option<String>,
    /// Human readable description.
    pub message: String,
    /// Observed value.
    pub current_value: Decimal,
    /// Value the observation was compared against.
    pub threshold_value: Decimal,
}

// ============================================================================
// Adjustments
// ============================================================================

/// Adjustment review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentStatus {
    /// Awaiting review.
    Pending,
    /// Approved; affects recalculation.
    Approved,
    /// Rejected; never affects recalculation.
    Rejected,
}

impl AdjustmentStatus {
    /// Returns the string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to move planned budget between categories of a season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtbAdjustment {
    /// Adjustment ID.
    pub id: Uuid,
    /// Season ID.
    pub season_id: Uuid,
    /// Category losing budget.
    pub from_category_id: Option<Uuid>,
    /// Category gaining budget.
    pub to_category_id: Option<Uuid>,
    /// Amount moved, positive with at most 2 decimal places.
    pub amount: Decimal,
    /// Justification.
    pub reason: String,
    /// Review status.
    pub status: AdjustmentStatus,
    /// Reviewer, set on approval and on rejection.
    pub approved_by: Option<Uuid>,
    /// Review time, set on approval and on rejection.
    pub approved_at: Option<DateTime<Utc>>,
    /// Reason given when rejected.
    pub rejection_reason: Option<String>,
    /// Requesting user.
    pub created_by: Option<Uuid>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Caller input for a new adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAdjustmentInput {
    /// Category losing budget.
    pub from_category_id: Option<Uuid>,
    /// Category gaining budget.
    pub to_category_id: Option<Uuid>,
    /// Amount to move.
    pub amount: Decimal,
    /// Justification.
    pub reason: String,
}
