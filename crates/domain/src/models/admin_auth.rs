//! Admin one-time-code login and session models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored login code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpCode {
    pub id: i32,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl OtpCode {
    /// A code can be redeemed while unused and strictly before its expiry.
    pub fn is_redeemable_at(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}

/// Data for persisting a freshly issued login code.
#[derive(Debug, Clone)]
pub struct NewOtpCode {
    pub email: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A stored admin session. Only the SHA-256 of the bearer token is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    pub id: i32,
    pub token_hash: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    /// Sessions have a fixed lifetime; `expires_at` itself is already expired.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Data for persisting a new session.
#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub token_hash: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Timing and rate-limit policy for admin login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpPolicy {
    pub code_ttl: Duration,
    pub max_codes_per_window: i64,
    pub rate_window: Duration,
    pub session_ttl: Duration,
}

impl Default for OtpPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(10),
            max_codes_per_window: 5,
            rate_window: Duration::minutes(15),
            session_ttl: Duration::hours(24),
        }
    }
}

/// Request body for `POST /api/admin/otp/send`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendCodeRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,
}

/// Response for a code request. Identical whether or not a code was sent.
#[derive(Debug, Clone, Serialize)]
pub struct SendCodeResponse {
    pub sent: bool,
}

/// Request body for `POST /api/admin/otp/verify`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

/// A freshly minted admin session token.
#[derive(Debug, Clone, Serialize)]
pub struct SessionTokenResponse {
    pub token: String,
    /// Lifetime in seconds.
    #[serde(rename = "expiresIn")]
    pub expires_in: i64,
}
