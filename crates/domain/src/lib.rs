//! Domain layer for the Atelier site backend.
//!
//! This crate contains:
//! - Domain models (Client, Inquiry, OTP code, admin session, contact submission)
//! - Store traits implemented by the persistence layer
//! - The edge request filter rule engine

pub mod models;
pub mod services;
