//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use stockplan_core::otb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "season_status")]
pub enum SeasonStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "locations_defined")]
    LocationsDefined,
    #[sea_orm(string_value = "plan_uploaded")]
    PlanUploaded,
    #[sea_orm(string_value = "otb_uploaded")]
    OtbUploaded,
    #[sea_orm(string_value = "range_uploaded")]
    RangeUploaded,
    #[sea_orm(string_value = "locked")]
    Locked,
}

impl From<SeasonStatus> for otb::SeasonStatus {
    fn from(status: SeasonStatus) -> Self {
        match status {
            SeasonStatus::Created => Self::Created,
            SeasonStatus::LocationsDefined => Self::LocationsDefined,
            SeasonStatus::PlanUploaded => Self::PlanUploaded,
            SeasonStatus::OtbUploaded => Self::OtbUploaded,
            SeasonStatus::RangeUploaded => Self::RangeUploaded,
            SeasonStatus::Locked => Self::Locked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "po_status")]
pub enum PoStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "submitted")]
    Submitted,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "partial")]
    Partial,
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<PoStatus> for otb::PurchaseOrderStatus {
    fn from(status: PoStatus) -> Self {
        match status {
            PoStatus::Draft => Self::Draft,
            PoStatus::Submitted => Self::Submitted,
            PoStatus::Confirmed => Self::Confirmed,
            PoStatus::Shipped => Self::Shipped,
            PoStatus::Partial => Self::Partial,
            PoStatus::Complete => Self::Complete,
            PoStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl PoStatus {
    /// Statuses whose orders commit OTB.
    #[must_use]
    pub fn consuming() -> Vec<Self> {
        Self::iter()
            .filter(|s| otb::PurchaseOrderStatus::from(*s).counts_toward_consumption())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "po_source")]
pub enum PoSource {
    #[sea_orm(string_value = "csv")]
    Csv,
    #[sea_orm(string_value = "api")]
    Api,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "adjustment_status")]
pub enum AdjustmentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<AdjustmentStatus> for otb::AdjustmentStatus {
    fn from(status: AdjustmentStatus) -> Self {
        match status {
            AdjustmentStatus::Pending => Self::Pending,
            AdjustmentStatus::Approved => Self::Approved,
            AdjustmentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<otb::AdjustmentStatus> for AdjustmentStatus {
    fn from(status: otb::AdjustmentStatus) -> Self {
        match status {
            otb::AdjustmentStatus::Pending => Self::Pending,
            otb::AdjustmentStatus::Approved => Self::Approved,
            otb::AdjustmentStatus::Rejected => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "audit_action")]
pub enum AuditAction {
    #[sea_orm(string_value = "create")]
    Create,
    #[sea_orm(string_value = "update")]
    Update,
    #[sea_orm(string_value = "delete")]
    Delete,
    #[sea_orm(string_value = "approve")]
    Approve,
    #[sea_orm(string_value = "lock")]
    Lock,
    #[sea_orm(string_value = "unlock")]
    Unlock,
    #[sea_orm(string_value = "login")]
    Login,
    #[sea_orm(string_value = "logout")]
    Logout,
    #[sea_orm(string_value = "upload")]
    Upload,
    #[sea_orm(string_value = "workflow_transition")]
    WorkflowTransition,
}

impl From<otb::AuditAction> for AuditAction {
    fn from(action: otb::AuditAction) -> Self {
        match action {
            otb::AuditAction::Create => Self::Create,
            otb::AuditAction::Update => Self::Update,
            otb::AuditAction::Approve => Self::Approve,
        }
    }
}
