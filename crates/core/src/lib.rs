//! Core business logic for Stockplan.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached through the store traits in [`otb::store`], which
//! `stockplan-db` implements over PostgreSQL.
//!
//! # Modules
//!
//! - `otb` - Open-to-buy positions, alerts, forecasts and budget adjustments

pub mod otb;
