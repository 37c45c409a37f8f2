//! Shared types, errors, and configuration for Stockplan.
//!
//! This crate provides common types used across all other crates:
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management
//! - JWT claims and token validation (caller identity)

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, Role};
pub use config::{AppConfig, OtbSettings};
pub use error::AppError;
pub use jwt::{JwtConfig, JwtError, JwtService};
