//! Engine tests over the in-memory store, plus property-based tests.

use chrono::{Datelike, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use stockplan_shared::types::PageRequest;
use uuid::Uuid;

use super::memory::MemoryStore;
use super::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct Fixture {
    store: MemoryStore,
    season_id: Uuid,
    company_id: Uuid,
    user: Uuid,
}

impl Fixture {
    fn new(status: SeasonStatus) -> Self {
        let store = MemoryStore::default();
        let season_id = Uuid::new_v4();
        let company_id = Uuid::new_v4();
        store.add_season(SeasonInfo {
            id: season_id,
            company_id: Some(company_id),
            name: "Spring Summer 26".to_string(),
            start_date: date(2026, 1, 1),
            end_date: date(2026, 6, 30),
            status,
        });
        Self {
            store,
            season_id,
            company_id,
            user: Uuid::new_v4(),
        }
    }

    fn category(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store.add_category(id, name);
        id
    }

    fn engine(&self) -> OtbEngine<MemoryStore, MemoryStore> {
        OtbEngine::new(self.store.clone(), self.store.clone())
    }

    fn pending(&self, from: Option<Uuid>, to: Option<Uuid>, amount: Decimal) -> CreateAdjustmentInput {
        CreateAdjustmentInput {
            from_category_id: from,
            to_category_id: to,
            amount,
            reason: "Rebalance toward best sellers".to_string(),
        }
    }
}

fn category_planned(positions: &[OtbPosition], category_id: Uuid) -> Decimal {
    positions
        .iter()
        .filter(|p| p.category_id == Some(category_id))
        .map(|p| p.planned_otb)
        .sum()
}

// ============================================================================
// Recalculation
// ============================================================================

#[tokio::test]
async fn test_recalculate_unknown_season() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let missing = Uuid::new_v4();

    let err = fx.engine().recalculate_season(missing).await.unwrap_err();

    assert!(matches!(err, OtbError::SeasonNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_recalculate_sums_plan_rows_across_locations() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(600.00));
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(400.00));
    fx.store.add_plan(fx.season_id, None, date(2026, 3, 1), dec!(50.00));

    let positions = fx.engine().recalculate_season(fx.season_id).await.unwrap();

    assert_eq!(positions.len(), 2);
    assert_eq!(category_planned(&positions, denim), dec!(1000.00));
    let uncategorized = positions.iter().find(|p| p.category_id.is_none()).unwrap();
    assert_eq!(uncategorized.planned_otb, dec!(50.00));
}

#[tokio::test]
async fn test_recalculate_is_idempotent() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 4, 1), dec!(500.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 12)),
        dec!(300.00),
        PurchaseOrderStatus::Confirmed,
    );

    let engine = fx.engine();
    let first = engine.recalculate_season(fx.season_id).await.unwrap();
    let second = engine.recalculate_season(fx.season_id).await.unwrap();

    let numbers = |positions: &[OtbPosition]| {
        positions
            .iter()
            .map(|p| (p.id, p.category_id, p.month, p.planned_otb, p.consumed_otb, p.available_otb))
            .collect::<Vec<_>>()
    };
    assert_eq!(numbers(&first), numbers(&second));
    assert_eq!(fx.store.all_positions(fx.season_id).len(), 2);
}

#[tokio::test]
async fn test_cancelled_and_undated_orders_are_excluded() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(2000.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 5)),
        dec!(1000.00),
        PurchaseOrderStatus::Cancelled,
    );
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        None,
        dec!(1000.00),
        PurchaseOrderStatus::Confirmed,
    );

    let positions = fx.engine().recalculate_season(fx.season_id).await.unwrap();

    assert_eq!(positions[0].consumed_otb, Decimal::ZERO);
    assert_eq!(positions[0].available_otb, dec!(2000.00));
}

#[tokio::test]
async fn test_recalculate_category_touches_only_that_category() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(100));
    fx.store.add_plan(fx.season_id, Some(knits), date(2026, 3, 1), dec!(100));

    let positions = fx
        .engine()
        .recalculate_category(fx.season_id, denim)
        .await
        .unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].category_id, Some(denim));
    assert_eq!(fx.store.all_positions(fx.season_id).len(), 1);
}

#[tokio::test]
async fn test_foreign_tenant_sees_season_as_missing() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);

    let scoped = fx.engine().for_company(Uuid::new_v4());
    let err = scoped.dashboard(fx.season_id).await.unwrap_err();
    assert!(matches!(err, OtbError::SeasonNotFound(_)));

    let own = fx.engine().for_company(fx.company_id);
    assert!(own.dashboard(fx.season_id).await.is_ok());
}

// ============================================================================
// Views
// ============================================================================

#[tokio::test]
async fn test_dashboard_totals_match_categories() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_plan(fx.season_id, Some(knits), date(2026, 4, 1), dec!(500.00));
    fx.store.add_plan(fx.season_id, None, date(2026, 4, 1), dec!(100.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 20)),
        dec!(250.00),
        PurchaseOrderStatus::Submitted,
    );
    fx.store.add_purchase_order(
        fx.season_id,
        Some(knits),
        Some(date(2026, 4, 2)),
        dec!(125.50),
        PurchaseOrderStatus::Shipped,
    );

    let dashboard = fx.engine().dashboard(fx.season_id).await.unwrap();

    let category_consumed: Decimal = dashboard.by_category.iter().map(|c| c.total_consumed).sum();
    assert_eq!(dashboard.total_consumed, category_consumed);
    assert_eq!(dashboard.total_consumed, dec!(375.50));
    assert_eq!(dashboard.total_planned, dec!(1600.00));
    assert_eq!(dashboard.by_category.len(), 3);
    assert_eq!(dashboard.by_month.len(), 2);
    assert_eq!(dashboard.by_month[0].month, date(2026, 3, 1));
    assert_eq!(dashboard.by_month[0].consumption_percentage, dec!(25.00));

    let denim_row = dashboard
        .by_category
        .iter()
        .find(|c| c.category_id == Some(denim))
        .unwrap();
    assert_eq!(denim_row.category_name.as_deref(), Some("Denim"));
    let uncategorized = dashboard
        .by_category
        .iter()
        .find(|c| c.category_id.is_none())
        .unwrap();
    assert_eq!(uncategorized.category_name, None);
}

#[tokio::test]
async fn test_consumption_reports_exhaustion_projection() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_plan(fx.season_id, Some(knits), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 2)),
        dec!(400.00),
        PurchaseOrderStatus::Confirmed,
    );

    let items = fx.engine().consumption(fx.season_id).await.unwrap();

    let denim_row = items.iter().find(|c| c.category_id == Some(denim)).unwrap();
    assert_eq!(denim_row.total_po_value, dec!(400.00));
    assert_eq!(denim_row.available_otb, dec!(600.00));
    assert_eq!(denim_row.consumption_percentage, dec!(40.00));
    let today = Utc::now().date_naive();
    assert_eq!(
        denim_row.projected_exhaustion_date,
        metrics::project_exhaustion(dec!(400.00), dec!(600.00), date(2026, 1, 1), today)
    );
    assert!(denim_row.projected_exhaustion_date.is_some());

    let knits_row = items.iter().find(|c| c.category_id == Some(knits)).unwrap();
    assert_eq!(knits_row.projected_exhaustion_date, None);
}

#[tokio::test]
async fn test_forecast_covers_current_and_future_months() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let today = Utc::now().date_naive();
    let this_month = types::first_of_month(today);
    let last_month = types::first_of_month(this_month.pred_opt().unwrap());
    let next_month = types::first_of_month(
        this_month
            .with_day(28)
            .unwrap()
            .checked_add_days(chrono::Days::new(7))
            .unwrap(),
    );
    fx.store.add_plan(fx.season_id, Some(denim), last_month, dec!(1000));
    fx.store.add_plan(fx.season_id, Some(denim), this_month, dec!(1000));
    fx.store.add_plan(fx.season_id, Some(denim), next_month, dec!(1000));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(last_month),
        dec!(900),
        PurchaseOrderStatus::Complete,
    );

    let forecast = fx.engine().forecast(fx.season_id).await.unwrap();

    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[0].month, this_month);
    assert_eq!(forecast[0].projected_consumption, dec!(900));
    // 100 + 1000 + 1000 available, minus 900 per projected month
    assert_eq!(forecast[0].projected_remaining, dec!(1200));
    assert_eq!(forecast[1].projected_remaining, dec!(300));
    assert_eq!(forecast[0].trend, ForecastTrend::Increasing);
}

#[tokio::test]
async fn test_alerts_low_otb_without_exceeded() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 9)),
        dec!(850.00),
        PurchaseOrderStatus::Confirmed,
    );

    let alerts = fx.engine().alerts(fx.season_id).await.unwrap();

    let low: Vec<_> = alerts
        .iter()
        .filter(|a| a.alert_type == AlertType::LowOtb)
        .collect();
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].severity, AlertSeverity::Warning);
    assert_eq!(low[0].category_id, Some(denim));
    assert_eq!(low[0].category_name.as_deref(), Some("Denim"));
    assert!(!alerts.iter().any(|a| a.alert_type == AlertType::OtbExceeded));
}

#[tokio::test]
async fn test_alert_thresholds_are_configurable() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 9)),
        dec!(850.00),
        PurchaseOrderStatus::Confirmed,
    );

    let engine = fx
        .engine()
        .with_thresholds(AlertThresholds::from_percents(10, 50, 25));

    assert!(engine.alerts(fx.season_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_positions_are_paginated_without_recalculating() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    for month in 1..=3 {
        fx.store.add_plan(fx.season_id, Some(denim), date(2026, month, 1), dec!(100));
    }
    let engine = fx.engine();
    engine.recalculate_season(fx.season_id).await.unwrap();
    let upserts = fx.store.upsert_count();

    let page = engine
        .positions(
            fx.season_id,
            &PageRequest {
                page: 2,
                per_page: 2,
            },
        )
        .await
        .unwrap();

    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].position.month, date(2026, 3, 1));
    assert_eq!(fx.store.upsert_count(), upserts);
}

#[tokio::test]
async fn test_position_flags_follow_low_otb_threshold() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_purchase_order(
        fx.season_id,
        Some(denim),
        Some(date(2026, 3, 10)),
        dec!(850.00),
        PurchaseOrderStatus::Confirmed,
    );

    let default_engine = fx.engine();
    default_engine.recalculate_season(fx.season_id).await.unwrap();
    let page = default_engine
        .positions(fx.season_id, &PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.data[0].consumption_percentage, dec!(85.00));
    assert!(page.data[0].is_low);
    assert!(!page.data[0].is_exceeded);

    let strict = fx
        .engine()
        .with_thresholds(AlertThresholds::from_percents(10, 50, 25));
    let page = strict
        .positions(fx.season_id, &PageRequest::default())
        .await
        .unwrap();
    assert!(!page.data[0].is_low);
    let alerts = strict.alerts(fx.season_id).await.unwrap();
    assert!(alerts.iter().all(|a| a.alert_type != AlertType::LowOtb));
}

// ============================================================================
// Adjustments
// ============================================================================

#[tokio::test]
async fn test_create_adjustment_records_pending_and_audits() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    let engine = fx.engine();
    engine.recalculate_season(fx.season_id).await.unwrap();
    let upserts = fx.store.upsert_count();

    let adjustment = engine
        .create_adjustment(fx.season_id, fx.pending(Some(denim), Some(knits), dec!(250.00)), fx.user)
        .await
        .unwrap();

    assert_eq!(adjustment.status, AdjustmentStatus::Pending);
    assert_eq!(adjustment.created_by, Some(fx.user));
    assert_eq!(fx.store.adjustment_count(), 1);
    assert_eq!(fx.store.upsert_count(), upserts);

    let audit = fx.store.audit_entries();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::Create);
    assert_eq!(audit[0].entity_type, "OTBAdjustment");
    assert_eq!(audit[0].entity_id, adjustment.id);
    assert_eq!(audit[0].season_id, Some(fx.season_id));
    assert_eq!(audit[0].new_data.as_ref().unwrap()["amount"], "250.00");
}

#[tokio::test]
async fn test_create_adjustment_insufficient_budget_writes_nothing() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(300.00));
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 4, 1), dec!(200.00));
    let engine = fx.engine();
    engine.recalculate_season(fx.season_id).await.unwrap();

    let err = engine
        .create_adjustment(fx.season_id, fx.pending(Some(denim), Some(knits), dec!(600.00)), fx.user)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OtbError::InsufficientBudget { requested, available }
            if requested == dec!(600.00) && available == dec!(500.00)
    ));
    assert_eq!(fx.store.adjustment_count(), 0);
    assert!(fx.store.audit_entries().is_empty());
}

#[tokio::test]
async fn test_create_adjustment_in_locked_season() {
    let fx = Fixture::new(SeasonStatus::Locked);

    let err = fx
        .engine()
        .create_adjustment(fx.season_id, fx.pending(None, None, dec!(10)), fx.user)
        .await
        .unwrap_err();

    assert!(matches!(err, OtbError::SeasonLocked(_)));
    assert_eq!(err.status_code(), 403);
    assert_eq!(fx.store.adjustment_count(), 0);
}

#[tokio::test]
async fn test_approve_moves_budget_and_conserves_total() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(700.00));
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 4, 1), dec!(300.00));
    fx.store.add_plan(fx.season_id, Some(knits), date(2026, 3, 1), dec!(400.00));
    let engine = fx.engine();
    let before = engine.recalculate_season(fx.season_id).await.unwrap();

    let adjustment = engine
        .create_adjustment(fx.season_id, fx.pending(Some(denim), Some(knits), dec!(250.00)), fx.user)
        .await
        .unwrap();
    let reviewer = Uuid::new_v4();
    let approved = engine.approve_adjustment(adjustment.id, reviewer).await.unwrap();

    assert_eq!(approved.status, AdjustmentStatus::Approved);
    assert_eq!(approved.approved_by, Some(reviewer));
    assert!(approved.approved_at.is_some());

    // Approval recalculated both categories before returning.
    let after = fx.store.all_positions(fx.season_id);
    assert_eq!(category_planned(&after, denim), dec!(750.00));
    assert_eq!(category_planned(&after, knits), dec!(650.00));
    let total = |positions: &[OtbPosition]| positions.iter().map(|p| p.planned_otb).sum::<Decimal>();
    assert_eq!(total(&after), total(&before));

    let audit = fx.store.audit_entries();
    assert_eq!(audit.last().unwrap().action, AuditAction::Approve);
    assert_eq!(
        audit.last().unwrap().description.as_deref(),
        Some("Approved adjustment of 250.00")
    );
}

#[tokio::test]
async fn test_second_approval_is_invalid_state_without_side_effects() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    fx.store.add_plan(fx.season_id, Some(knits), date(2026, 3, 1), dec!(1000.00));
    let engine = fx.engine();
    engine.recalculate_season(fx.season_id).await.unwrap();
    let adjustment = engine
        .create_adjustment(fx.season_id, fx.pending(Some(denim), Some(knits), dec!(100)), fx.user)
        .await
        .unwrap();
    let first = engine.approve_adjustment(adjustment.id, fx.user).await.unwrap();
    let upserts = fx.store.upsert_count();
    let audits = fx.store.audit_entries().len();

    let err = engine
        .approve_adjustment(adjustment.id, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OtbError::InvalidState { status: AdjustmentStatus::Approved, .. }
    ));
    assert_eq!(fx.store.upsert_count(), upserts);
    assert_eq!(fx.store.audit_entries().len(), audits);
    let stored = engine.store().find_adjustment(adjustment.id).await.unwrap().unwrap();
    assert_eq!(stored.approved_at, first.approved_at);
    assert_eq!(stored.approved_by, first.approved_by);
}

#[tokio::test]
async fn test_approve_unknown_adjustment() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let missing = Uuid::new_v4();

    let err = fx
        .engine()
        .approve_adjustment(missing, fx.user)
        .await
        .unwrap_err();

    assert!(matches!(err, OtbError::AdjustmentNotFound(id) if id == missing));
}

#[tokio::test]
async fn test_reject_leaves_positions_untouched() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let denim = fx.category("Denim");
    let knits = fx.category("Knits");
    fx.store.add_plan(fx.season_id, Some(denim), date(2026, 3, 1), dec!(1000.00));
    let engine = fx.engine();
    engine.recalculate_season(fx.season_id).await.unwrap();
    let adjustment = engine
        .create_adjustment(fx.season_id, fx.pending(Some(denim), Some(knits), dec!(100)), fx.user)
        .await
        .unwrap();
    let upserts = fx.store.upsert_count();

    let rejected = engine
        .reject_adjustment(adjustment.id, fx.user, "Knits already over-bought")
        .await
        .unwrap();

    assert_eq!(rejected.status, AdjustmentStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("Knits already over-bought"));
    assert_eq!(fx.store.upsert_count(), upserts);
    let audit = fx.store.audit_entries();
    assert_eq!(audit.last().unwrap().action, AuditAction::Update);
    assert_eq!(
        audit.last().unwrap().description.as_deref(),
        Some("Rejected adjustment: Knits already over-bought")
    );

    // Rejected adjustments never move budget.
    let positions = engine.recalculate_season(fx.season_id).await.unwrap();
    assert_eq!(category_planned(&positions, denim), dec!(1000.00));
    assert!(matches!(
        engine.approve_adjustment(adjustment.id, fx.user).await,
        Err(OtbError::InvalidState { status: AdjustmentStatus::Rejected, .. })
    ));
}

#[tokio::test]
async fn test_adjustments_listed_newest_first() {
    let fx = Fixture::new(SeasonStatus::OtbUploaded);
    let engine = fx.engine();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let adjustment = engine
            .create_adjustment(fx.season_id, fx.pending(None, None, dec!(10)), fx.user)
            .await
            .unwrap();
        ids.push(adjustment.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page = engine
        .adjustments(fx.season_id, &PageRequest::default())
        .await
        .unwrap();

    assert_eq!(page.meta.total, 3);
    let listed: Vec<Uuid> = page.data.iter().map(|a| a.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

// ============================================================================
// Properties
// ============================================================================

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(future)
}

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

proptest! {
    /// Available is never negative, whatever the spend.
    #[test]
    fn prop_available_is_never_negative(
        plans in prop::collection::vec((0usize..3, 1u32..=6, 0i64..1_000_000), 1..12),
        orders in prop::collection::vec((0usize..3, 1u32..=6, 0i64..2_000_000), 0..12),
    ) {
        let fx = Fixture::new(SeasonStatus::OtbUploaded);
        let categories = [fx.category("A"), fx.category("B"), fx.category("C")];
        for (c, m, amount) in &plans {
            fx.store.add_plan(fx.season_id, Some(categories[*c]), date(2026, *m, 1), cents(*amount));
        }
        for (c, m, amount) in &orders {
            fx.store.add_purchase_order(
                fx.season_id,
                Some(categories[*c]),
                Some(date(2026, *m, 15)),
                cents(*amount),
                PurchaseOrderStatus::Confirmed,
            );
        }

        let positions = run(fx.engine().recalculate_season(fx.season_id)).unwrap();

        for p in &positions {
            prop_assert!(p.available_otb >= Decimal::ZERO);
            prop_assert_eq!(p.available_otb, (p.planned_otb - p.consumed_otb).max(Decimal::ZERO));
        }
    }

    /// An approved adjustment moves exactly its amount between categories.
    #[test]
    fn prop_adjustment_conserves_season_total(
        from_plans in prop::collection::vec((1u32..=6, 1i64..1_000_000), 1..6),
        to_plans in prop::collection::vec((1u32..=6, 1i64..1_000_000), 1..6),
        share in 1i64..=100,
    ) {
        let fx = Fixture::new(SeasonStatus::OtbUploaded);
        let from = fx.category("From");
        let to = fx.category("To");
        for (m, amount) in &from_plans {
            fx.store.add_plan(fx.season_id, Some(from), date(2026, *m, 1), cents(*amount));
        }
        for (m, amount) in &to_plans {
            fx.store.add_plan(fx.season_id, Some(to), date(2026, *m, 1), cents(*amount));
        }
        let engine = fx.engine();

        let before = run(engine.recalculate_season(fx.season_id)).unwrap();
        let available: Decimal = before
            .iter()
            .filter(|p| p.category_id == Some(from))
            .map(|p| p.available_otb)
            .sum();
        let amount = (available * Decimal::from(share) / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, rust_decimal::RoundingStrategy::ToZero);
        prop_assume!(amount > Decimal::ZERO);

        let adjustment = run(engine.create_adjustment(
            fx.season_id,
            fx.pending(Some(from), Some(to), amount),
            fx.user,
        ))
        .unwrap();
        run(engine.approve_adjustment(adjustment.id, fx.user)).unwrap();
        let after = run(engine.recalculate_season(fx.season_id)).unwrap();

        prop_assert_eq!(category_planned(&after, from), category_planned(&before, from) - amount);
        prop_assert_eq!(category_planned(&after, to), category_planned(&before, to) + amount);
        let total = |ps: &[OtbPosition]| ps.iter().map(|p| p.planned_otb).sum::<Decimal>();
        prop_assert_eq!(total(&after), total(&before));
    }

    /// Shares always add back up to the rounded total.
    #[test]
    fn prop_allocation_sums_to_total(
        total in -10_000_000i64..10_000_000,
        weights in prop::collection::vec(0i64..1_000_000, 1..10),
    ) {
        let total = cents(total);
        let weights: Vec<Decimal> = weights.into_iter().map(cents).collect();

        let shares = allocate_by_weights(total, &weights, 2);

        prop_assert_eq!(shares.len(), weights.len());
        prop_assert_eq!(shares.iter().copied().sum::<Decimal>(), total);
    }
}
