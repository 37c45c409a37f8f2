//! OTB management routes.
//!
//! Reads are open to every authenticated role. Recalculation and adjustment
//! changes need an admin or manager. Every handler is scoped to the caller's
//! company; seasons of other companies answer 404.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use stockplan_core::otb::{CreateAdjustmentInput, PositionView};
use stockplan_shared::types::PageRequest;
use tracing::info;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the OTB routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/otb-management/{season_id}/position", get(get_positions))
        .route("/otb-management/{season_id}/dashboard", get(get_dashboard))
        .route("/otb-management/{season_id}/consumption", get(get_consumption))
        .route("/otb-management/{season_id}/forecast", get(get_forecast))
        .route("/otb-management/{season_id}/alerts", get(get_alerts))
        .route("/otb-management/{season_id}/recalculate", post(recalculate))
        .route("/otb-management/{season_id}/adjust", post(create_adjustment))
        .route("/otb-management/{season_id}/adjustments", get(list_adjustments))
        .route(
            "/otb-management/adjustments/{adjustment_id}/approve",
            post(approve_adjustment),
        )
        .route(
            "/otb-management/adjustments/{adjustment_id}/reject",
            post(reject_adjustment),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for moving budget between categories.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// Category losing budget.
    pub from_category_id: Option<Uuid>,
    /// Category gaining budget.
    pub to_category_id: Option<Uuid>,
    /// Amount to move.
    pub amount: Decimal,
    /// Justification, 10 to 2000 characters.
    pub reason: String,
}

/// Request body for rejecting an adjustment.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// Explanation, 10 to 1000 characters.
    pub rejection_reason: String,
}

/// Response for a recalculation.
#[derive(Debug, Serialize)]
pub struct RecalculateResponse {
    /// Season ID.
    pub season_id: Uuid,
    /// Number of positions written.
    pub positions_updated: usize,
    /// The written positions.
    pub positions: Vec<PositionView>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/otb-management/{season_id}/position` - Stored positions, paginated.
async fn get_positions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let positions = state
        .otb_engine(auth.company_id())
        .positions(season_id, &page)
        .await?;
    Ok(Json(positions))
}

/// GET `/otb-management/{season_id}/dashboard` - Totals by category and month.
async fn get_dashboard(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let dashboard = state.otb_engine(auth.company_id()).dashboard(season_id).await?;
    Ok(Json(dashboard))
}

/// GET `/otb-management/{season_id}/consumption` - Per-category consumption.
async fn get_consumption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let consumption = state
        .otb_engine(auth.company_id())
        .consumption(season_id)
        .await?;
    Ok(Json(consumption))
}

/// GET `/otb-management/{season_id}/forecast` - Monthly projection.
async fn get_forecast(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let forecast = state.otb_engine(auth.company_id()).forecast(season_id).await?;
    Ok(Json(forecast))
}

/// GET `/otb-management/{season_id}/alerts` - Threshold alerts.
async fn get_alerts(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let alerts = state.otb_engine(auth.company_id()).alerts(season_id).await?;
    Ok(Json(alerts))
}

/// POST `/otb-management/{season_id}/recalculate` - Rebuild every position.
async fn recalculate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_otb_manager()?;

    let engine = state.otb_engine(auth.company_id());
    let positions = engine.recalculate_season(season_id).await?;

    info!(
        season_id = %season_id,
        user_id = %auth.user_id(),
        positions = positions.len(),
        "OTB recalculated"
    );

    Ok(Json(RecalculateResponse {
        season_id,
        positions_updated: positions.len(),
        positions: engine.position_views(positions),
    }))
}

/// POST `/otb-management/{season_id}/adjust` - Request a budget transfer.
async fn create_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
    Json(payload): Json<AdjustRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_otb_manager()?;

    let input = CreateAdjustmentInput {
        from_category_id: payload.from_category_id,
        to_category_id: payload.to_category_id,
        amount: payload.amount,
        reason: payload.reason,
    };
    let adjustment = state
        .otb_engine(auth.company_id())
        .create_adjustment(season_id, input, auth.user_id())
        .await?;

    Ok((StatusCode::CREATED, Json(adjustment)))
}

/// GET `/otb-management/{season_id}/adjustments` - Adjustments, newest first.
async fn list_adjustments(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(season_id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let adjustments = state
        .otb_engine(auth.company_id())
        .adjustments(season_id, &page)
        .await?;
    Ok(Json(adjustments))
}

/// POST `/otb-management/adjustments/{adjustment_id}/approve`
async fn approve_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(adjustment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_otb_manager()?;

    let adjustment = state
        .otb_engine(auth.company_id())
        .approve_adjustment(adjustment_id, auth.user_id())
        .await?;
    Ok(Json(adjustment))
}

/// POST `/otb-management/adjustments/{adjustment_id}/reject`
async fn reject_adjustment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(adjustment_id): Path<Uuid>,
    Json(payload): Json<RejectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_otb_manager()?;

    let adjustment = state
        .otb_engine(auth.company_id())
        .reject_adjustment(adjustment_id, auth.user_id(), &payload.rejection_reason)
        .await?;
    Ok(Json(adjustment))
}
