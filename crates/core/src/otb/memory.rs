//! In-memory store used by the engine tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::otb::adjustment::AdjustmentReview;
use crate::otb::calculation::accumulate;
use crate::otb::error::OtbError;
use crate::otb::store::{
    AdjustmentLedger, AuditEntry, AuditSink, PositionStore, ReferenceData, SpendSource,
};
use crate::otb::types::{
    AdjustmentStatus, AdjustmentTotals, BucketKey, BucketTotals, CategoryTotals, MonthTotals,
    OtbAdjustment, OtbPosition, OtbTotals, PositionUpsert, PurchaseOrderStatus, SeasonInfo,
};

struct PlanRow {
    season_id: Uuid,
    category_id: Option<Uuid>,
    month: NaiveDate,
    approved_spend_limit: Decimal,
}

struct PurchaseOrderRow {
    season_id: Uuid,
    category_id: Option<Uuid>,
    order_date: Option<NaiveDate>,
    po_value: Decimal,
    status: PurchaseOrderStatus,
}

#[derive(Default)]
struct State {
    seasons: HashMap<Uuid, SeasonInfo>,
    categories: HashMap<Uuid, String>,
    plan_rows: Vec<PlanRow>,
    purchase_orders: Vec<PurchaseOrderRow>,
    adjustments: Vec<OtbAdjustment>,
    positions: BTreeMap<(Uuid, BucketKey), OtbPosition>,
    upserts: usize,
    audit: Vec<AuditEntry>,
}

/// Shared-state store; clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn add_season(&self, season: SeasonInfo) {
        self.lock().seasons.insert(season.id, season);
    }

    pub fn add_category(&self, id: Uuid, name: &str) {
        self.lock().categories.insert(id, name.to_string());
    }

    pub fn add_plan(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
        month: NaiveDate,
        approved_spend_limit: Decimal,
    ) {
        self.lock().plan_rows.push(PlanRow {
            season_id,
            category_id,
            month,
            approved_spend_limit,
        });
    }

    pub fn add_purchase_order(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
        order_date: Option<NaiveDate>,
        po_value: Decimal,
        status: PurchaseOrderStatus,
    ) {
        self.lock().purchase_orders.push(PurchaseOrderRow {
            season_id,
            category_id,
            order_date,
            po_value,
            status,
        });
    }

    pub fn upsert_count(&self) -> usize {
        self.lock().upserts
    }

    pub fn adjustment_count(&self) -> usize {
        self.lock().adjustments.len()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock().audit.clone()
    }

    pub fn all_positions(&self, season_id: Uuid) -> Vec<OtbPosition> {
        self.lock()
            .positions
            .values()
            .filter(|p| p.season_id == season_id)
            .cloned()
            .collect()
    }

    fn season_positions(state: &State, season_id: Uuid) -> Vec<OtbPosition> {
        let mut positions: Vec<OtbPosition> = state
            .positions
            .values()
            .filter(|p| p.season_id == season_id)
            .cloned()
            .collect();
        positions.sort_by_key(|p| (p.month, p.category_id));
        positions
    }
}

fn matches_category(filter: Option<Uuid>, category_id: Option<Uuid>) -> bool {
    filter.is_none() || filter == category_id
}

#[async_trait]
impl ReferenceData for MemoryStore {
    async fn find_season(&self, season_id: Uuid) -> Result<Option<SeasonInfo>, OtbError> {
        Ok(self.lock().seasons.get(&season_id).cloned())
    }

    async fn category_names(&self, category_ids: &[Uuid]) -> Result<HashMap<Uuid, String>, OtbError> {
        let state = self.lock();
        Ok(category_ids
            .iter()
            .filter_map(|id| state.categories.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}

#[async_trait]
impl SpendSource for MemoryStore {
    async fn planned_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError> {
        let state = self.lock();
        let mut totals = BucketTotals::new();
        for row in state
            .plan_rows
            .iter()
            .filter(|r| r.season_id == season_id && matches_category(category_id, r.category_id))
        {
            accumulate(&mut totals, row.category_id, row.month, row.approved_spend_limit);
        }
        Ok(totals)
    }

    async fn consumed_by_bucket(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<BucketTotals, OtbError> {
        let state = self.lock();
        let mut totals = BucketTotals::new();
        for po in state.purchase_orders.iter().filter(|po| {
            po.season_id == season_id
                && po.status.counts_toward_consumption()
                && matches_category(category_id, po.category_id)
        }) {
            if let Some(order_date) = po.order_date {
                accumulate(&mut totals, po.category_id, order_date, po.po_value);
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl AdjustmentLedger for MemoryStore {
    async fn insert_adjustment(&self, adjustment: &OtbAdjustment) -> Result<(), OtbError> {
        self.lock().adjustments.push(adjustment.clone());
        Ok(())
    }

    async fn find_adjustment(&self, adjustment_id: Uuid) -> Result<Option<OtbAdjustment>, OtbError> {
        Ok(self
            .lock()
            .adjustments
            .iter()
            .find(|a| a.id == adjustment_id)
            .cloned())
    }

    async fn list_adjustments(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbAdjustment>, OtbError> {
        let mut items: Vec<OtbAdjustment> = self
            .lock()
            .adjustments
            .iter()
            .filter(|a| a.season_id == season_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(items
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .collect())
    }

    async fn count_adjustments(&self, season_id: Uuid) -> Result<u64, OtbError> {
        let count = self
            .lock()
            .adjustments
            .iter()
            .filter(|a| a.season_id == season_id)
            .count();
        Ok(count as u64)
    }

    async fn apply_review(
        &self,
        adjustment_id: Uuid,
        review: &AdjustmentReview,
    ) -> Result<Option<OtbAdjustment>, OtbError> {
        let mut state = self.lock();
        let Some(adjustment) = state
            .adjustments
            .iter_mut()
            .find(|a| a.id == adjustment_id && a.status == AdjustmentStatus::Pending)
        else {
            return Ok(None);
        };
        review.apply_to(adjustment);
        Ok(Some(adjustment.clone()))
    }

    async fn approved_totals(
        &self,
        season_id: Uuid,
        category_id: Option<Uuid>,
    ) -> Result<AdjustmentTotals, OtbError> {
        let mut totals = AdjustmentTotals::default();
        for a in self.lock().adjustments.iter().filter(|a| {
            a.season_id == season_id
                && a.status == AdjustmentStatus::Approved
                && (category_id.is_none()
                    || a.from_category_id == category_id
                    || a.to_category_id == category_id)
        }) {
            totals.add(a.from_category_id, a.to_category_id, a.amount);
        }
        Ok(totals)
    }
}

#[async_trait]
impl PositionStore for MemoryStore {
    async fn upsert_position(&self, position: &PositionUpsert) -> Result<OtbPosition, OtbError> {
        let now = Utc::now();
        let mut state = self.lock();
        state.upserts += 1;
        let stored = state
            .positions
            .entry((position.season_id, position.key))
            .and_modify(|p| {
                p.planned_otb = position.planned_otb;
                p.consumed_otb = position.consumed_otb;
                p.available_otb = position.available_otb;
                p.last_calculated = Some(now);
                p.updated_at = now;
            })
            .or_insert_with(|| OtbPosition {
                id: Uuid::new_v4(),
                season_id: position.season_id,
                category_id: position.key.category_id,
                month: position.key.month,
                planned_otb: position.planned_otb,
                consumed_otb: position.consumed_otb,
                available_otb: position.available_otb,
                last_calculated: Some(now),
                created_at: now,
                updated_at: now,
            });
        Ok(stored.clone())
    }

    async fn positions_by_season(
        &self,
        season_id: Uuid,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let state = self.lock();
        Ok(Self::season_positions(&state, season_id)
            .into_iter()
            .skip(usize::try_from(offset).unwrap())
            .take(usize::try_from(limit).unwrap())
            .collect())
    }

    async fn count_positions(&self, season_id: Uuid) -> Result<u64, OtbError> {
        let state = self.lock();
        Ok(Self::season_positions(&state, season_id).len() as u64)
    }

    async fn positions_by_category(
        &self,
        season_id: Uuid,
        category_id: Uuid,
    ) -> Result<Vec<OtbPosition>, OtbError> {
        let state = self.lock();
        Ok(Self::season_positions(&state, season_id)
            .into_iter()
            .filter(|p| p.category_id == Some(category_id))
            .collect())
    }

    async fn category_totals(&self, season_id: Uuid) -> Result<Vec<CategoryTotals>, OtbError> {
        let state = self.lock();
        let mut grouped: BTreeMap<Option<Uuid>, CategoryTotals> = BTreeMap::new();
        for p in Self::season_positions(&state, season_id) {
            let entry = grouped.entry(p.category_id).or_insert(CategoryTotals {
                category_id: p.category_id,
                total_planned: Decimal::ZERO,
                total_consumed: Decimal::ZERO,
                total_available: Decimal::ZERO,
            });
            entry.total_planned += p.planned_otb;
            entry.total_consumed += p.consumed_otb;
            entry.total_available += p.available_otb;
        }
        Ok(grouped.into_values().collect())
    }

    async fn month_totals(&self, season_id: Uuid) -> Result<Vec<MonthTotals>, OtbError> {
        let state = self.lock();
        let mut grouped: BTreeMap<NaiveDate, MonthTotals> = BTreeMap::new();
        for p in Self::season_positions(&state, season_id) {
            let entry = grouped.entry(p.month).or_insert(MonthTotals {
                month: p.month,
                planned_otb: Decimal::ZERO,
                consumed_otb: Decimal::ZERO,
                available_otb: Decimal::ZERO,
            });
            entry.planned_otb += p.planned_otb;
            entry.consumed_otb += p.consumed_otb;
            entry.available_otb += p.available_otb;
        }
        Ok(grouped.into_values().collect())
    }

    async fn season_totals(&self, season_id: Uuid) -> Result<OtbTotals, OtbError> {
        let state = self.lock();
        let mut totals = OtbTotals::default();
        for p in Self::season_positions(&state, season_id) {
            totals.total_planned += p.planned_otb;
            totals.total_consumed += p.consumed_otb;
            totals.total_available += p.available_otb;
        }
        Ok(totals)
    }
}

#[async_trait]
impl AuditSink for MemoryStore {
    async fn record(&self, entry: AuditEntry) -> Result<(), OtbError> {
        self.lock().audit.push(entry);
        Ok(())
    }
}
