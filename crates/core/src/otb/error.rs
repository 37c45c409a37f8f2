//! OTB error types.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::otb::types::AdjustmentStatus;

/// Errors raised by the OTB engine.
///
/// Everything except `Storage` is detected before any write.
#[derive(Debug, Error)]
pub enum OtbError {
    /// Season does not exist or belongs to another company.
    #[error("Season {0} not found")]
    SeasonNotFound(Uuid),

    /// Adjustment does not exist.
    #[error("Adjustment {0} not found")]
    AdjustmentNotFound(Uuid),

    /// Adjustment has already been reviewed.
    #[error("Adjustment is already {status}")]
    InvalidState {
        /// The adjustment.
        id: Uuid,
        /// Its current status.
        status: AdjustmentStatus,
    },

    /// Source category does not have enough available OTB.
    #[error("Insufficient OTB in source category. Available: {available}, Requested: {requested}")]
    InsufficientBudget {
        /// Amount requested by the adjustment.
        requested: Decimal,
        /// Sum of available OTB for the source category.
        available: Decimal,
    },

    /// Season is locked and cannot be modified.
    #[error("Season {0} is locked and cannot be modified")]
    SeasonLocked(Uuid),

    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    /// Underlying store failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl OtbError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::SeasonNotFound(_) | Self::AdjustmentNotFound(_) => 404,
            Self::InvalidState { .. } | Self::InsufficientBudget { .. } | Self::Validation(_) => {
                400
            }
            Self::SeasonLocked(_) => 403,
            Self::Storage(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SeasonNotFound(_) => "SEASON_NOT_FOUND",
            Self::AdjustmentNotFound(_) => "ADJUSTMENT_NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::InsufficientBudget { .. } => "INSUFFICIENT_BUDGET",
            Self::SeasonLocked(_) => "SEASON_LOCKED",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
