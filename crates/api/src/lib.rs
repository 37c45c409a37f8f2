//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - OTB management routes
//! - Authentication middleware
//! - Error-to-response mapping

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use sea_orm::DatabaseConnection;
use stockplan_core::otb::{AlertThresholds, OtbEngine};
use stockplan_db::{AuditRepository, OtbRepository};
use stockplan_shared::{JwtService, OtbSettings};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Alert thresholds and other OTB tuning.
    pub otb: OtbSettings,
    /// Upper bound on request handling time.
    pub request_timeout: Duration,
}

impl AppState {
    /// Builds an OTB engine scoped to one company.
    #[must_use]
    pub fn otb_engine(&self, company_id: Uuid) -> OtbEngine<OtbRepository, AuditRepository> {
        let db = (*self.db).clone();
        OtbEngine::new(OtbRepository::new(db.clone()), AuditRepository::new(db))
            .with_thresholds(AlertThresholds::from_percents(
                self.otb.low_otb_percent,
                self.otb.underutilized_percent,
                self.otb.imbalance_percent,
            ))
            .for_company(company_id)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
