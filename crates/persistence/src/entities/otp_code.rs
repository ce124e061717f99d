//! OTP code entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::OtpCode;

/// Database row mapping for the otp_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct OtpCodeEntity {
    pub id: i32,
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub created_at: DateTime<Utc>,
}

impl From<OtpCodeEntity> for OtpCode {
    fn from(entity: OtpCodeEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            code: entity.code,
            expires_at: entity.expires_at,
            used: entity.used,
            created_at: entity.created_at,
        }
    }
}
