//! Storage abstractions used by the auth and contact services.
//!
//! The persistence crate implements these against PostgreSQL. The `Mock*`
//! implementations keep everything in memory for development and testing.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

use crate::models::{AdminSession, Inquiry, NewAdminSession, NewInquiry, NewOtpCode, OtpCode};

/// Persistence of admin login codes.
#[async_trait::async_trait]
pub trait OtpCodeStore: Send + Sync {
    /// Number of codes issued to `email` strictly after `since`.
    async fn count_issued_since(&self, email: &str, since: DateTime<Utc>)
        -> Result<i64, sqlx::Error>;

    async fn insert(&self, code: &NewOtpCode) -> Result<OtpCode, sqlx::Error>;

    /// Atomically marks a matching unused, unexpired code as used and returns it.
    /// Returns `None` when no such code exists.
    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, sqlx::Error>;

    /// Deletes codes that expired at or before `now` and were issued at or
    /// before `issued_before`.
    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        issued_before: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>;
}

/// Persistence of admin sessions, keyed by token hash.
#[async_trait::async_trait]
pub trait AdminSessionStore: Send + Sync {
    async fn insert(&self, session: &NewAdminSession) -> Result<AdminSession, sqlx::Error>;

    /// Finds a session by exact token hash with `expires_at > now`.
    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>, sqlx::Error>;

    /// Returns true if a session was deleted.
    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, sqlx::Error>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error>;
}

/// Write side of inquiry storage used by the public contact form.
#[async_trait::async_trait]
pub trait InquiryStore: Send + Sync {
    async fn record(&self, inquiry: &NewInquiry) -> Result<Inquiry, sqlx::Error>;
}

/// In-memory login code store.
#[derive(Debug, Default)]
pub struct MockOtpCodeStore {
    codes: Mutex<Vec<OtpCode>>,
    fail: bool,
}

impl MockOtpCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails with a pool timeout.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Snapshot of all stored codes.
    pub fn codes(&self) -> Vec<OtpCode> {
        self.codes.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<OtpCode>>, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.codes.lock().map_err(|_| sqlx::Error::PoolClosed)
    }
}

#[async_trait::async_trait]
impl OtpCodeStore for MockOtpCodeStore {
    async fn count_issued_since(
        &self,
        email: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let codes = self.guard()?;
        Ok(codes
            .iter()
            .filter(|c| c.email == email && c.created_at > since)
            .count() as i64)
    }

    async fn insert(&self, code: &NewOtpCode) -> Result<OtpCode, sqlx::Error> {
        let mut codes = self.guard()?;
        let stored = OtpCode {
            id: codes.len() as i32 + 1,
            email: code.email.clone(),
            code: code.code.clone(),
            expires_at: code.expires_at,
            used: false,
            created_at: code.created_at,
        };
        codes.push(stored.clone());
        Ok(stored)
    }

    async fn consume(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        let mut codes = self.guard()?;
        let found = codes
            .iter_mut()
            .find(|c| c.email == email && c.code == code && c.is_redeemable_at(now));
        Ok(found.map(|c| {
            c.used = true;
            c.clone()
        }))
    }

    async fn purge_expired(
        &self,
        now: DateTime<Utc>,
        issued_before: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let mut codes = self.guard()?;
        let before = codes.len();
        codes.retain(|c| !(c.expires_at <= now && c.created_at <= issued_before));
        Ok((before - codes.len()) as u64)
    }
}

/// In-memory admin session store.
#[derive(Debug, Default)]
pub struct MockAdminSessionStore {
    sessions: Mutex<Vec<AdminSession>>,
    fail: bool,
}

impl MockAdminSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sessions(&self) -> Vec<AdminSession> {
        self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, Vec<AdminSession>>, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.sessions.lock().map_err(|_| sqlx::Error::PoolClosed)
    }
}

#[async_trait::async_trait]
impl AdminSessionStore for MockAdminSessionStore {
    async fn insert(&self, session: &NewAdminSession) -> Result<AdminSession, sqlx::Error> {
        let mut sessions = self.guard()?;
        let stored = AdminSession {
            id: sessions.len() as i32 + 1,
            token_hash: session.token_hash.clone(),
            email: session.email.clone(),
            expires_at: session.expires_at,
            created_at: session.created_at,
        };
        sessions.push(stored.clone());
        Ok(stored)
    }

    async fn find_active(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>, sqlx::Error> {
        let sessions = self.guard()?;
        Ok(sessions
            .iter()
            .find(|s| s.token_hash == token_hash && s.is_active_at(now))
            .cloned())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> Result<bool, sqlx::Error> {
        let mut sessions = self.guard()?;
        let before = sessions.len();
        sessions.retain(|s| s.token_hash != token_hash);
        Ok(sessions.len() != before)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let mut sessions = self.guard()?;
        let before = sessions.len();
        sessions.retain(|s| s.is_active_at(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory inquiry store.
#[derive(Debug, Default)]
pub struct MockInquiryStore {
    inquiries: Mutex<Vec<Inquiry>>,
    fail: bool,
}

impl MockInquiryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn inquiries(&self) -> Vec<Inquiry> {
        self.inquiries.lock().map(|i| i.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl InquiryStore for MockInquiryStore {
    async fn record(&self, inquiry: &NewInquiry) -> Result<Inquiry, sqlx::Error> {
        if self.fail {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut inquiries = self.inquiries.lock().map_err(|_| sqlx::Error::PoolClosed)?;
        let stored = Inquiry {
            id: inquiries.len() as i32 + 1,
            client_id: None,
            name: inquiry.name.clone(),
            email: inquiry.email.clone(),
            company: inquiry.company.clone(),
            budget: inquiry.budget.clone(),
            message: inquiry.message.clone(),
            created_at: Utc::now(),
        };
        inquiries.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_code(code: &str, created_at: DateTime<Utc>) -> NewOtpCode {
        NewOtpCode {
            email: "admin@example.com".into(),
            code: code.into(),
            created_at,
            expires_at: created_at + Duration::minutes(10),
        }
    }

    #[tokio::test]
    async fn test_mock_consume_is_single_use() {
        let store = MockOtpCodeStore::new();
        let now = Utc::now();
        store.insert(&new_code("111111", now)).await.unwrap();

        assert!(store
            .consume("admin@example.com", "111111", now)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .consume("admin@example.com", "111111", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mock_purge_keeps_recent_codes() {
        let store = MockOtpCodeStore::new();
        let now = Utc::now();
        store
            .insert(&new_code("111111", now - Duration::minutes(30)))
            .await
            .unwrap();
        store
            .insert(&new_code("222222", now - Duration::minutes(12)))
            .await
            .unwrap();

        // The second code is expired but still inside the rate window.
        let purged = store
            .purge_expired(now, now - Duration::minutes(15))
            .await
            .unwrap();
        assert_eq!(purged, 1);
        assert_eq!(store.codes().len(), 1);
        assert_eq!(store.codes()[0].code, "222222");
    }

    #[tokio::test]
    async fn test_mock_session_lookup_and_delete() {
        let store = MockAdminSessionStore::new();
        let now = Utc::now();
        store
            .insert(&NewAdminSession {
                token_hash: "abc".into(),
                email: "admin@example.com".into(),
                created_at: now,
                expires_at: now + Duration::hours(24),
            })
            .await
            .unwrap();

        assert!(store.find_active("abc", now).await.unwrap().is_some());
        assert!(store
            .find_active("abc", now + Duration::hours(24))
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_by_token_hash("abc").await.unwrap());
        assert!(!store.delete_by_token_hash("abc").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_stores() {
        assert!(MockOtpCodeStore::failing()
            .count_issued_since("a@b.co", Utc::now())
            .await
            .is_err());
        assert!(MockAdminSessionStore::failing()
            .purge_expired(Utc::now())
            .await
            .is_err());
        let inquiry = NewInquiry {
            name: "Jo".into(),
            email: "jo@example.com".into(),
            company: None,
            budget: None,
            message: "Hi".into(),
        };
        assert!(MockInquiryStore::failing().record(&inquiry).await.is_err());
    }
}
