//! Admin session entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::AdminSession;

/// Database row mapping for the admin_sessions table.
#[derive(Debug, Clone, FromRow)]
pub struct AdminSessionEntity {
    pub id: i32,
    pub token_hash: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<AdminSessionEntity> for AdminSession {
    fn from(entity: AdminSessionEntity) -> Self {
        Self {
            id: entity.id,
            token_hash: entity.token_hash,
            email: entity.email,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}
