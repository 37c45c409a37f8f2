//! Request-level failures that happen before or around the OTB engine.
//!
//! Engine failures (`OtbError`) carry their own status mapping. This type
//! covers refusals decided about the caller, such as token and role checks.

use thiserror::Error;

/// A request was refused outside the OTB domain rules.
#[derive(Debug, Error)]
pub enum AppError {
    /// The bearer token is missing, expired or does not verify.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The caller's role may not recalculate or review budgets.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The season or adjustment is unknown to the caller's company.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request body or query could not be accepted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Startup or wiring failure; the message is never sent to clients.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status sent back to the caller.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Machine-readable `error` field of the JSON body.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
