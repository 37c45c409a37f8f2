//! Open-to-buy (OTB) calculation engine.
//!
//! Planned spend from OTB plan rows and committed spend from purchase orders
//! are aggregated per (category, month) bucket, combined with approved
//! inter-category adjustments and materialized as positions. Dashboards,
//! consumption detail, forecasts and alerts are derived from those positions.

pub mod adjustment;
pub mod alerts;
pub mod allocation;
pub mod calculation;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod metrics;
pub mod store;
pub mod types;

#[cfg(test)]
mod memory;
#[cfg(test)]
mod tests;

pub use adjustment::{AdjustmentReview, AdjustmentWorkflow};
pub use alerts::{AlertEngine, AlertThresholds};
pub use allocation::allocate_by_weights;
pub use calculation::OtbCalculator;
pub use engine::OtbEngine;
pub use error::OtbError;
pub use forecast::Forecaster;
pub use store::{
    AdjustmentLedger, AuditAction, AuditEntry, AuditSink, OtbStore, PositionStore, ReferenceData,
    SpendSource,
};
pub use types::*;
