//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod admin_session;
pub mod client;
pub mod inquiry;
pub mod otp_code;

pub use admin_session::AdminSessionEntity;
pub use client::ClientEntity;
pub use inquiry::{InquiryEntity, InquiryWithClientEntity};
pub use otp_code::OtpCodeEntity;
