//! The OTB engine: recalculation, views and the adjustment workflow.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use stockplan_shared::types::{PageRequest, PageResponse};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::otb::adjustment::AdjustmentWorkflow;
use crate::otb::alerts::{AlertEngine, AlertThresholds};
use crate::otb::calculation::OtbCalculator;
use crate::otb::error::OtbError;
use crate::otb::forecast::Forecaster;
use crate::otb::metrics::{consumption_percentage, project_exhaustion};
use crate::otb::store::{AuditAction, AuditEntry, AuditSink, OtbStore};
use crate::otb::types::{
    AdjustmentStatus, CategoryConsumption, CategorySummary, CategoryTotals,
    CreateAdjustmentInput, MonthForecast, MonthSummary, OtbAdjustment, OtbAlert, OtbDashboard,
    OtbPosition, PositionView, SeasonInfo,
};

const ADJUSTMENT_ENTITY: &str = "OTBAdjustment";

/// Computes OTB positions and runs the adjustment workflow.
///
/// Built per request from its collaborators. The dashboard, consumption,
/// forecast and alert views recalculate the season first, so they always
/// reflect current plan, purchase order and adjustment data.
pub struct OtbEngine<S, A> {
    store: S,
    audit: A,
    thresholds: AlertThresholds,
    company_id: Option<Uuid>,
}

impl<S, A> OtbEngine<S, A>
where
    S: OtbStore,
    A: AuditSink,
{
    /// Creates an engine with default alert thresholds and no tenant scope.
    pub fn new(store: S, audit: A) -> Self {
        Self {
            store,
            audit,
            thresholds: AlertThresholds::default(),
            company_id: None,
        }
    }

    /// Overrides the alert thresholds.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: AlertThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Restricts the engine to seasons owned by `company_id`.
    #[must_use]
    pub fn for_company(mut self, company_id: Uuid) -> Self {
        self.company_id = Some(company_id);
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    async fn load_season(&self, season_id: Uuid) -> Result<SeasonInfo, OtbError> {
        let season = self
            .store
            .find_season(season_id)
            .await?
            .ok_or(OtbError::SeasonNotFound(season_id))?;

        match (self.company_id, season.company_id) {
            (Some(scope), owner) if owner != Some(scope) => {
                warn!(season_id = %season_id, company_id = %scope, "Season outside tenant scope");
                Err(OtbError::SeasonNotFound(season_id))
            }
            _ => Ok(season),
        }
    }

    // ========================================================================
    // Recalculation
    // ========================================================================

    /// Recalculates and stores every position of a season.
    pub async fn recalculate_season(&self, season_id: Uuid) -> Result<Vec<OtbPosition>, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, None).await
    }

    /// Recalculates and stores the positions of one category.
    pub async fn recalculate_category(
        &self,
        season_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, Some(category_id)).await
    }

    async fn recalculate(
        &self,
        season: &SeasonInfo,
        category_id: Option<Uuid>,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let planned = self.store.planned_by_bucket(season.id, category_id).await?;
        let consumed = self.store.consumed_by_bucket(season.id, category_id).await?;
        let adjustments = self.store.approved_totals(season.id, category_id).await?;

        let computed = OtbCalculator::compute(season.id, &planned, &consumed, &adjustments);

        let mut positions = Vec::with_capacity(computed.len());
        for position in &computed {
            positions.push(self.store.upsert_position(position).await?);
        }

        debug!(
            season_id = %season.id,
            category_id = ?category_id,
            positions = positions.len(),
            "Recalculated OTB positions"
        );
        Ok(positions)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Attaches the derived flags, judged against this engine's thresholds.
    #[must_use]
    pub fn position_views(&self, positions: Vec<OtbPosition>) -> Vec<PositionView> {
        positions
            .into_iter()
            .map(|p| PositionView::new(p, self.thresholds.low_otb_percent))
            .collect()
    }

    /// Stored positions of a season, ordered by month, with the total count.
    pub async fn positions(
        &self,
        season_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<PositionView>, OtbError> {
        self.load_season(season_id).await?;
        let page = page.normalized();

        let positions = self
            .store
            .positions_by_season(season_id, page.offset(), page.limit())
            .await?;
        let total = self.store.count_positions(season_id).await?;

        Ok(PageResponse::new(
            self.position_views(positions),
            page.page,
            page.per_page,
            total,
        ))
    }

    /// Season, category and month totals.
    pub async fn dashboard(&self, season_id: Uuid) -> Result<OtbDashboard, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, None).await?;

        let totals = self.store.season_totals(season_id).await?;
        let by_category = self.category_summaries(season_id).await?;
        let by_month = self
            .store
            .month_totals(season_id)
            .await?
            .into_iter()
            .map(|m| MonthSummary {
                month: m.month,
                consumption_percentage: consumption_percentage(m.consumed_otb, m.planned_otb),
                planned_otb: m.planned_otb,
                consumed_otb: m.consumed_otb,
                available_otb: m.available_otb,
            })
            .collect();

        Ok(OtbDashboard {
            season_id,
            total_planned: totals.total_planned,
            total_consumed: totals.total_consumed,
            total_available: totals.total_available,
            consumption_percentage: consumption_percentage(
                totals.total_consumed,
                totals.total_planned,
            ),
            by_category,
            by_month,
        })
    }

    /// Per-category consumption with a projected exhaustion date.
    ///
    /// The spend rate is measured from the season's start date.
    pub async fn consumption(&self, season_id: Uuid) -> Result<Vec<CategoryConsumption>, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, None).await?;

        let today = Utc::now().date_naive();
        let items = self
            .category_summaries(season_id)
            .await?
            .into_iter()
            .map(|c| CategoryConsumption {
                season_id,
                projected_exhaustion_date: project_exhaustion(
                    c.total_consumed,
                    c.total_available,
                    season.start_date,
                    today,
                ),
                category_id: c.category_id,
                category_name: c.category_name,
                planned_otb: c.total_planned,
                total_po_value: c.total_consumed,
                consumed_otb: c.total_consumed,
                available_otb: c.total_available,
                consumption_percentage: c.consumption_percentage,
            })
            .collect();

        Ok(items)
    }

    /// Projection for the current and remaining months.
    pub async fn forecast(&self, season_id: Uuid) -> Result<Vec<MonthForecast>, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, None).await?;

        let months = self.store.month_totals(season_id).await?;
        Ok(Forecaster::project(
            season_id,
            &months,
            Utc::now().date_naive(),
        ))
    }

    /// Threshold alerts for every funded category.
    pub async fn alerts(&self, season_id: Uuid) -> Result<Vec<OtbAlert>, OtbError> {
        let season = self.load_season(season_id).await?;
        self.recalculate(&season, None).await?;

        let categories = self.category_summaries(season_id).await?;
        let alerts = AlertEngine::evaluate(season_id, &categories, &self.thresholds);

        if !alerts.is_empty() {
            info!(season_id = %season_id, alerts = alerts.len(), "OTB alerts raised");
        }
        Ok(alerts)
    }

    async fn category_summaries(&self, season_id: Uuid) -> Result<Vec<CategorySummary>, OtbError> {
        let totals = self.store.category_totals(season_id).await?;
        let ids: Vec<Uuid> = totals.iter().filter_map(|t| t.category_id).collect();
        let names = if ids.is_empty() {
            HashMap::new()
        } else {
            self.store.category_names(&ids).await?
        };

        Ok(totals
            .into_iter()
            .map(|t| summarize(t, &names))
            .collect())
    }

    // ========================================================================
    // Adjustments
    // ========================================================================

    /// Records a pending adjustment.
    ///
    /// # Errors
    ///
    /// `SeasonNotFound`, `SeasonLocked`, `Validation`, or
    /// `InsufficientBudget` when the source category's stored available OTB
    /// is less than the amount. Nothing is written on error.
    pub async fn create_adjustment(
        &self,
        season_id: Uuid,
        input: CreateAdjustmentInput,
        created_by: Uuid,
    ) -> Result<OtbAdjustment, OtbError> {
        let season = self.load_season(season_id).await?;
        AdjustmentWorkflow::validate_create(&season, &input)?;

        if let Some(from) = input.from_category_id {
            let available: Decimal = self
                .store
                .positions_by_category(season_id, from)
                .await?
                .iter()
                .map(|p| p.available_otb)
                .sum();
            AdjustmentWorkflow::check_budget(input.amount, available)?;
        }

        let adjustment = OtbAdjustment {
            id: Uuid::now_v7(),
            season_id,
            from_category_id: input.from_category_id,
            to_category_id: input.to_category_id,
            amount: input.amount,
            reason: input.reason.trim().to_string(),
            status: AdjustmentStatus::Pending,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_by: Some(created_by),
            created_at: Utc::now(),
        };
        self.store.insert_adjustment(&adjustment).await?;

        self.audit
            .record(AuditEntry {
                entity_type: ADJUSTMENT_ENTITY.to_string(),
                entity_id: adjustment.id,
                action: AuditAction::Create,
                user_id: Some(created_by),
                old_data: None,
                new_data: Some(json!({
                    "from_category_id": adjustment.from_category_id,
                    "to_category_id": adjustment.to_category_id,
                    "amount": adjustment.amount.to_string(),
                    "reason": adjustment.reason,
                })),
                description: None,
                season_id: Some(season_id),
            })
            .await?;

        info!(
            adjustment_id = %adjustment.id,
            season_id = %season_id,
            amount = %adjustment.amount,
            "OTB adjustment created"
        );
        Ok(adjustment)
    }

    /// Approves a pending adjustment and recalculates both categories.
    ///
    /// # Errors
    ///
    /// `AdjustmentNotFound`, or `InvalidState` if the adjustment was already
    /// reviewed (including by a concurrent caller). No recalculation happens
    /// on error.
    pub async fn approve_adjustment(
        &self,
        adjustment_id: Uuid,
        approved_by: Uuid,
    ) -> Result<OtbAdjustment, OtbError> {
        let (adjustment, season) = self.load_adjustment(adjustment_id).await?;
        let review = AdjustmentWorkflow::approve(&adjustment, approved_by)?;

        let Some(approved) = self.store.apply_review(adjustment_id, &review).await? else {
            return Err(self.lost_review(adjustment_id).await);
        };

        for category_id in [approved.from_category_id, approved.to_category_id]
            .into_iter()
            .flatten()
        {
            self.recalculate(&season, Some(category_id)).await?;
        }

        self.audit
            .record(AuditEntry {
                entity_type: ADJUSTMENT_ENTITY.to_string(),
                entity_id: approved.id,
                action: AuditAction::Approve,
                user_id: Some(approved_by),
                old_data: Some(json!({ "status": AdjustmentStatus::Pending })),
                new_data: Some(json!({ "status": AdjustmentStatus::Approved })),
                description: Some(format!("Approved adjustment of {}", approved.amount)),
                season_id: Some(approved.season_id),
            })
            .await?;

        info!(adjustment_id = %adjustment_id, approved_by = %approved_by, "OTB adjustment approved");
        Ok(approved)
    }

    /// Rejects a pending adjustment. Positions are not touched.
    ///
    /// # Errors
    ///
    /// `AdjustmentNotFound`, `InvalidState`, or `Validation` for a rejection
    /// reason outside 10 to 1000 characters.
    pub async fn reject_adjustment(
        &self,
        adjustment_id: Uuid,
        rejected_by: Uuid,
        rejection_reason: &str,
    ) -> Result<OtbAdjustment, OtbError> {
        let (adjustment, _season) = self.load_adjustment(adjustment_id).await?;
        let review = AdjustmentWorkflow::reject(&adjustment, rejected_by, rejection_reason)?;

        let Some(rejected) = self.store.apply_review(adjustment_id, &review).await? else {
            return Err(self.lost_review(adjustment_id).await);
        };

        let reason = rejected.rejection_reason.clone().unwrap_or_default();
        self.audit
            .record(AuditEntry {
                entity_type: ADJUSTMENT_ENTITY.to_string(),
                entity_id: rejected.id,
                action: AuditAction::Update,
                user_id: Some(rejected_by),
                old_data: Some(json!({ "status": AdjustmentStatus::Pending })),
                new_data: Some(json!({
                    "status": AdjustmentStatus::Rejected,
                    "rejection_reason": reason,
                })),
                description: Some(format!("Rejected adjustment: {reason}")),
                season_id: Some(rejected.season_id),
            })
            .await?;

        info!(adjustment_id = %adjustment_id, rejected_by = %rejected_by, "OTB adjustment rejected");
        Ok(rejected)
    }

    /// A season's adjustments, newest first, with the total count.
    pub async fn adjustments(
        &self,
        season_id: Uuid,
        page: &PageRequest,
    ) -> Result<PageResponse<OtbAdjustment>, OtbError> {
        self.load_season(season_id).await?;
        let page = page.normalized();

        let items = self
            .store
            .list_adjustments(season_id, page.offset(), page.limit())
            .await?;
        let total = self.store.count_adjustments(season_id).await?;

        Ok(PageResponse::new(items, page.page, page.per_page, total))
    }

    async fn load_adjustment(
        &self,
        adjustment_id: Uuid,
    ) -> Result<(OtbAdjustment, SeasonInfo), OtbError> {
        let adjustment = self
            .store
            .find_adjustment(adjustment_id)
            .await?
            .ok_or(OtbError::AdjustmentNotFound(adjustment_id))?;

        let season = match self.load_season(adjustment.season_id).await {
            Ok(season) => season,
            Err(OtbError::SeasonNotFound(_)) => {
                return Err(OtbError::AdjustmentNotFound(adjustment_id));
            }
            Err(e) => return Err(e),
        };
        Ok((adjustment, season))
    }

    /// Builds the error for a review that lost the race to another reviewer.
    async fn lost_review(&self, adjustment_id: Uuid) -> OtbError {
        match self.store.find_adjustment(adjustment_id).await {
            Ok(Some(current)) => OtbError::InvalidState {
                id: adjustment_id,
                status: current.status,
            },
            Ok(None) => OtbError::AdjustmentNotFound(adjustment_id),
            Err(e) => e,
        }
    }
}

fn summarize(totals: CategoryTotals, names: &HashMap<Uuid, String>) -> CategorySummary {
    CategorySummary {
        category_name: totals.category_id.and_then(|id| names.get(&id).cloned()),
        consumption_percentage: consumption_percentage(
            totals.total_consumed,
            totals.total_planned,
        ),
        category_id: totals.category_id,
        total_planned: totals.total_planned,
        total_consumed: totals.total_consumed,
        total_available: totals.total_available,
    }
}
