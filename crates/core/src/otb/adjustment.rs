//! Adjustment validation and review state machine.
//!
//! Valid transitions:
//! - Pending → Approved (approve)
//! - Pending → Rejected (reject)
//!
//! Both targets are terminal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::otb::error::OtbError;
use crate::otb::types::{AdjustmentStatus, CreateAdjustmentInput, OtbAdjustment, SeasonInfo};

const REASON_MIN_CHARS: usize = 10;
const REASON_MAX_CHARS: usize = 2000;
const REJECTION_REASON_MAX_CHARS: usize = 1000;
const AMOUNT_MAX_SCALE: u32 = 2;

/// The outcome of reviewing a pending adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustmentReview {
    /// Budget moves on the next recalculation.
    Approve {
        /// Reviewer.
        approved_by: Uuid,
        /// Review time.
        approved_at: DateTime<Utc>,
    },
    /// Budget never moves.
    Reject {
        /// Reviewer.
        rejected_by: Uuid,
        /// Review time.
        rejected_at: DateTime<Utc>,
        /// Reviewer's explanation.
        rejection_reason: String,
    },
}

impl AdjustmentReview {
    /// Status the adjustment moves to.
    #[must_use]
    pub const fn new_status(&self) -> AdjustmentStatus {
        match self {
            Self::Approve { .. } => AdjustmentStatus::Approved,
            Self::Reject { .. } => AdjustmentStatus::Rejected,
        }
    }

    /// The reviewing user.
    #[must_use]
    pub const fn reviewed_by(&self) -> Uuid {
        match self {
            Self::Approve { approved_by, .. } => *approved_by,
            Self::Reject { rejected_by, .. } => *rejected_by,
        }
    }

    /// When the review happened.
    #[must_use]
    pub const fn reviewed_at(&self) -> DateTime<Utc> {
        match self {
            Self::Approve { approved_at, .. } => *approved_at,
            Self::Reject { rejected_at, .. } => *rejected_at,
        }
    }

    /// Rejection reason, for rejections.
    #[must_use]
    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Approve { .. } => None,
            Self::Reject {
                rejection_reason, ..
            } => Some(rejection_reason),
        }
    }

    /// Applies the review to an in-memory adjustment.
    pub fn apply_to(&self, adjustment: &mut OtbAdjustment) {
        adjustment.status = self.new_status();
        adjustment.approved_by = Some(self.reviewed_by());
        adjustment.approved_at = Some(self.reviewed_at());
        adjustment.rejection_reason = self.rejection_reason().map(ToString::to_string);
    }
}

/// Stateless rules for creating and reviewing adjustments.
pub struct AdjustmentWorkflow;

impl AdjustmentWorkflow {
    /// Checks that an adjustment may be created in `season`.
    ///
    /// # Returns
    /// * `Err(OtbError::SeasonLocked)` if the season is locked
    /// * `Err(OtbError::Validation)` if the amount is not positive, has more
    ///   than 2 decimal places, or the reason is not 10 to 2000 characters
    pub fn validate_create(
        season: &SeasonInfo,
        input: &CreateAdjustmentInput,
    ) -> Result<(), OtbError> {
        if season.status.is_locked() {
            return Err(OtbError::SeasonLocked(season.id));
        }

        if input.amount <= Decimal::ZERO {
            return Err(OtbError::Validation(
                "Adjustment amount must be greater than zero".to_string(),
            ));
        }
        if input.amount.normalize().scale() > AMOUNT_MAX_SCALE {
            return Err(OtbError::Validation(
                "Adjustment amount must have at most 2 decimal places".to_string(),
            ));
        }

        Self::check_text("Reason", &input.reason, REASON_MAX_CHARS)
    }

    /// Checks that the source category can cover `requested`.
    pub fn check_budget(requested: Decimal, available: Decimal) -> Result<(), OtbError> {
        if available < requested {
            return Err(OtbError::InsufficientBudget {
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Approve a pending adjustment.
    ///
    /// # Returns
    /// * `Ok(AdjustmentReview::Approve)` if the adjustment is pending
    /// * `Err(OtbError::InvalidState)` otherwise
    pub fn approve(
        adjustment: &OtbAdjustment,
        approved_by: Uuid,
    ) -> Result<AdjustmentReview, OtbError> {
        Self::ensure_pending(adjustment)?;
        Ok(AdjustmentReview::Approve {
            approved_by,
            approved_at: Utc::now(),
        })
    }

    /// Reject a pending adjustment.
    ///
    /// # Returns
    /// * `Ok(AdjustmentReview::Reject)` if the adjustment is pending
    /// * `Err(OtbError::InvalidState)` if it was already reviewed
    /// * `Err(OtbError::Validation)` if the reason is not 10 to 1000 characters
    pub fn reject(
        adjustment: &OtbAdjustment,
        rejected_by: Uuid,
        rejection_reason: &str,
    ) -> Result<AdjustmentReview, OtbError> {
        Self::ensure_pending(adjustment)?;
        Self::check_text("Rejection reason", rejection_reason, REJECTION_REASON_MAX_CHARS)?;
        Ok(AdjustmentReview::Reject {
            rejected_by,
            rejected_at: Utc::now(),
            rejection_reason: rejection_reason.trim().to_string(),
        })
    }

    fn ensure_pending(adjustment: &OtbAdjustment) -> Result<(), OtbError> {
        match adjustment.status {
            AdjustmentStatus::Pending => Ok(()),
            status => Err(OtbError::InvalidState {
                id: adjustment.id,
                status,
            }),
        }
    }

    fn check_text(field: &str, text: &str, max_chars: usize) -> Result<(), OtbError> {
        let len = text.trim().chars().count();
        if (REASON_MIN_CHARS..=max_chars).contains(&len) {
            Ok(())
        } else {
            Err(OtbError::Validation(format!(
                "{field} must be between {REASON_MIN_CHARS} and {max_chars} characters"
            )))
        }
    }
}
