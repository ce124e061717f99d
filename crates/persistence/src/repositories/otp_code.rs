//! OTP code repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{NewOtpCode, OtpCode};
use domain::services::OtpCodeStore;

use crate::entities::OtpCodeEntity;
use crate::metrics::QueryTimer;

/// Repository for admin login codes.
#[derive(Clone)]
pub struct OtpCodeRepository {
    pool: PgPool,
}

impl OtpCodeRepository {
    /// Creates a new OtpCodeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OtpCodeStore for OtpCodeRepository {
    async fn count_issued_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_otp_codes_since");
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM otp_codes
            WHERE email = $1 AND created_at > $2
            "#,
        )
        .bind(email)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;
        timer.record();
        Ok(count.0)
    }

    async fn insert(&self, code: &NewOtpCode) -> Result<OtpCode, sqlx::Error> {
        let timer = QueryTimer::new("insert_otp_code");
        let result = sqlx::query_as::<_, OtpCodeEntity>(
            r#"
            INSERT INTO otp_codes (email, code, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, code, expires_at, used, created_at
            "#,
        )
        .bind(&code.email)
        .bind(&code.code)
        .bind(code.expires_at)
        .bind(code.created_at)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        // Single statement: the row lock makes concurrent redemptions of the
        // same code race to one winner; losers skip the locked row.
        let timer = QueryTimer::new("consume_otp_code");
        let result = sqlx::query_as::<_, OtpCodeEntity>(
            r#"
            UPDATE otp_codes SET used = TRUE
            WHERE id = (
                SELECT id FROM otp_codes
                WHERE email = $1 AND code = $2 AND used = FALSE AND expires_at > $3
                ORDER BY created_at DESC
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            AND used = FALSE
            RETURNING id, email, code, expires_at, used, created_at
            "#,
        )
        .bind(email)
        .bind(code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map(|row| row.map(Into::into))
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        issued_before: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let timer = QueryTimer::new("purge_expired_otp_codes");
        let result = sqlx::query(
            r#"
            DELETE FROM otp_codes
            WHERE expires_at <= $1 AND created_at <= $2
            "#,
        )
        .bind(now)
        .bind(issued_before)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected())
    }
}
