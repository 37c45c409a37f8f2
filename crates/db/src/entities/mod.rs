//! `SeaORM` entity definitions.

pub mod audit_logs;
pub mod categories;
pub mod otb_adjustments;
pub mod otb_plan;
pub mod otb_positions;
pub mod purchase_orders;
pub mod sea_orm_active_enums;
pub mod seasons;
