//! Persistence seams for the engine.
//!
//! `stockplan-db` implements these traits over PostgreSQL. Every method
//! reports store failures as [`OtbError::Storage`].

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::otb::adjustment::AdjustmentReview;
use crate::otb::error::OtbError;
use crate::otb::types::{
    AdjustmentTotals, BucketTotals, CategoryTotals, MonthTotals, OtbAdjustment, OtbPosition,
    OtbTotals, PositionUpsert, SeasonInfo,
};

/// Season and category lookups owned by other subsystems.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Finds a season by id.
    async fn find_season(&self, season_id: Uuid) -> Result<Option<SeasonInfo>, OtbError>;

    /// Display names for the given categories. Unknown ids are omitted.
    async fn category_names(&self, category_ids: &[Uuid]) -> Result<HashMap<Uuid, String>, OtbError>;
}

/// Planned and committed spend, summed per bucket.
#[async_trait]
pub trait SpendSource: Send + Sync {
    /// Sum of approved spend limits from OTB plan rows, across locations.
    async fn planned_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError>;

    /// Sum of purchase order values, excluding cancelled and undated orders.
    async fn consumed_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError>;
}

/// Append-only record of adjustments.
#[async_trait]
pub trait AdjustmentLedger: Send + Sync {
    /// Inserts a new adjustment.
    async fn insert_adjustment(&self, adjustment: &OtbAdjustment) -> Result<(), OtbError>;

    /// Finds an adjustment by id.
    async fn find_adjustment(&self, adjustment_id: Uuid) -> Result<Option<OtbAdjustment>, OtbError>;

    /// A season's adjustments, newest first.
    async fn list_adjustments(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbAdjustment>, OtbError>;

    /// Number of adjustments in a season.
    async fn count_adjustments(&self, season_id: Uuid) -> Result<u64, OtbError>;

    /// Records a review if, and only if, the adjustment is still pending.
    ///
    /// Returns the updated adjustment, or `None` when another reviewer got
    /// there first.
    async fn apply_review(
        &self,
        adjustment_id: Uuid,
        review: &AdjustmentReview,
    ) -> Result<Option<OtbAdjustment>, OtbError>;

    /// Sums of approved amounts by source and destination category. With a
    /// category filter only adjustments touching that category are counted.
    async fn approved_totals(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<AdjustmentTotals, OtbError>;
}

/// Materialized positions.
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Overwrites or inserts the position for the bucket and stamps
    /// `last_calculated`.
    async fn upsert_position(&self, position: &PositionUpsert) -> Result<OtbPosition, OtbError>;

    /// A season's positions ordered by month.
    async fn positions_by_season(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbPosition>, OtbError>;

    /// Number of positions in a season.
    async fn count_positions(&self, season_id: Uuid) -> Result<u64, OtbError>;

    /// All positions of one category, ordered by month.
    async fn positions_by_category(
        &self,
        season_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<OtbPosition>, OtbError>;

    /// Totals per category, ordered by category id with uncategorized first.
    async fn category_totals(&self, season_id: Uuid) -> Result<Vec<CategoryTotals>, OtbError>;

    /// Totals per month, ordered by month.
    async fn month_totals(&self, season_id: Uuid) -> Result<Vec<MonthTotals>, OtbError>;

    /// Grand totals.
    async fn season_totals(&self, season_id: Uuid) -> Result<OtbTotals, OtbError>;
}

/// Everything the engine reads and writes.
pub trait OtbStore: ReferenceData + SpendSource + AdjustmentLedger + PositionStore {}

impl<T> OtbStore for T where T: ReferenceData + SpendSource + AdjustmentLedger + PositionStore {}

/// Audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    /// Record created.
    Create,
    /// Record changed.
    Update,
    /// Record approved.
    Approve,
}

/// One audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Kind of entity, e.g. `OTBAdjustment`.
    pub entity_type: String,
    /// Entity ID.
    pub entity_id: Uuid,
    /// What happened.
    pub action: AuditAction,
    /// Acting user.
    pub user_id: Option<Uuid>,
    /// State before the change.
    pub old_data: Option<serde_json::Value>,
    /// State after the change.
    pub new_data: Option<serde_json::Value>,
    /// Human readable summary.
    pub description: Option<String>,
    /// Season the entity belongs to.
    pub season_id: Option<Uuid>,
}

/// Write-only audit log.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends an entry.
    async fn record(&self, entry: AuditEntry) -> Result<(), OtbError>;
}
