//! PostgreSQL implementation of the OTB engine's store traits.
//!
//! `OtbRepository` reads plans and purchase orders, keeps the adjustment
//! ledger and materializes positions. Every `DbErr` surfaces as
//! [`OtbError::Storage`].

mod adjustments;
mod positions;
mod reference;
mod spend;

use chrono::Utc;
use sea_orm::{DatabaseConnection, DbErr};
use stockplan_core::otb::{OtbAdjustment, OtbError, OtbPosition, SeasonInfo};

use crate::entities::{otb_adjustments, otb_positions, seasons};

/// Repository backing [`stockplan_core::otb::OtbEngine`].
#[derive(Debug, Clone)]
pub struct OtbRepository {
    db: DatabaseConnection,
}

impl OtbRepository {
    /// Creates a new OTB repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

pub(crate) fn storage_error(err: DbErr) -> OtbError {
    tracing::error!(error = %err, "OTB storage error");
    OtbError::Storage(err.to_string())
}

fn season_info(model: seasons::Model) -> SeasonInfo {
    SeasonInfo {
        id: model.id,
        company_id: model.company_id,
        name: model.name,
        start_date: model.start_date,
        end_date: model.end_date,
        status: model.status.into(),
    }
}

fn position_from_model(model: otb_positions::Model) -> OtbPosition {
    OtbPosition {
        id: model.id,
        season_id: model.season_id,
        category_id: model.category_id,
        month: model.month,
        planned_otb: model.planned_otb,
        consumed_otb: model.consumed_otb,
        available_otb: model.available_otb,
        last_calculated: model.last_calculated.map(|t| t.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn adjustment_from_model(model: otb_adjustments::Model) -> OtbAdjustment {
    OtbAdjustment {
        id: model.id,
        season_id: model.season_id,
        from_category_id: model.from_category_id,
        to_category_id: model.to_category_id,
        amount: model.amount,
        reason: model.reason,
        status: model.status.into(),
        approved_by: model.approved_by,
        approved_at: model.approved_at.map(|t| t.with_timezone(&Utc)),
        rejection_reason: model.rejection_reason,
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
