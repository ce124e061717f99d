//! Persistence layer for the Atelier backend.
//!
//! This crate contains:
//! - Database connection management and schema bootstrap
//! - Entity definitions (database row mappings)
//! - Repository implementations
//! - Pool and query metrics

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
