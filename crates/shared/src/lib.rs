//! Shared utilities and common types for the Atelier backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cryptographic utilities (hashing, one-time code and session token generation)
//! - Common validation logic (email format, HTML escaping)

pub mod crypto;
pub mod validation;
