//! Domain models for Atelier.

pub mod admin_auth;
pub mod client;
pub mod contact;
pub mod inquiry;

pub use admin_auth::{AdminSession, NewAdminSession, NewOtpCode, OtpCode, OtpPolicy};
pub use client::{Client, ClientDetail, ClientStatus};
pub use contact::ContactSubmission;
pub use inquiry::{Inquiry, InquiryFilter, InquiryWithClient, NewInquiry};
