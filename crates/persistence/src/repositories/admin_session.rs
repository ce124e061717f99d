//! Admin session repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{AdminSession, NewAdminSession};
use domain::services::AdminSessionStore;

use crate::entities::AdminSessionEntity;
use crate::metrics::QueryTimer;

/// Repository for admin sessions.
#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
}

impl AdminSessionRepository {
    /// Creates a new AdminSessionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdminSessionStore for AdminSessionRepository {
    async fn insert(&self, session: &NewAdminSession) -> Result<AdminSession, sqlx::Error> {
        let timer = QueryTimer::new("insert_admin_session");
        let result = sqlx::query_as::<_, AdminSessionEntity>(
            r#"
            INSERT INTO admin_sessions (token_hash, email, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, token_hash, email, expires_at, created_at
            "#,
        )
        .bind(&session.token_hash)
        .bind(&session.email)
        .bind(session.expires_at)
        .bind(session.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>, sqlx::Error> {
        let timer = QueryTimer::new("find_active_admin_session");
        let result = sqlx::query_as::<_, AdminSessionEntity>(
            r#"
            SELECT id, token_hash, email, expires_at, created_at
            FROM admin_sessions
            WHERE token_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into))
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_admin_session");
        let result = sqlx::query("DELETE FROM admin_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_expired_admin_sessions");
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
