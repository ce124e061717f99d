//! HTTP route handlers.

use serde::Serialize;

pub mod admin_otp;
pub mod clients;
pub mod contact;
pub mod health;
pub mod inquiries;
pub mod instagram;

/// `{"success": true}`
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
