//! Sweeps expired admin sessions and stale login codes.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::services::AdminAuthService;

pub struct AuthCleanupJob {
    auth: Arc<AdminAuthService>,
    every_minutes: u64,
}

impl AuthCleanupJob {
    pub fn new(auth: Arc<AdminAuthService>, every_minutes: u64) -> Self {
        Self {
            auth,
            every_minutes,
        }
    }
}

#[async_trait::async_trait]
impl Job for AuthCleanupJob {
    fn name(&self) -> &'static str {
        "auth_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(self.every_minutes)
    }

    async fn execute(&self) -> Result<(), String> {
        let swept = self
            .auth
            .sweep_expired_at(Utc::now())
            .await
            .map_err(|e| e.to_string())?;
        if swept.sessions > 0 || swept.codes > 0 {
            info!(
                sessions = swept.sessions,
                codes = swept.codes,
                "Expired admin credentials removed"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::MockMailer;
    use domain::models::OtpPolicy;
    use domain::services::{MockAdminSessionStore, MockOtpCodeStore};

    fn job(sessions: MockAdminSessionStore) -> AuthCleanupJob {
        let auth = AdminAuthService::new(
            "owner@atelier.studio",
            OtpPolicy::default(),
            "Atelier",
            Arc::new(MockOtpCodeStore::new()),
            Arc::new(sessions),
            Arc::new(MockMailer::new()),
        );
        AuthCleanupJob::new(Arc::new(auth), 15)
    }

    #[tokio::test]
    async fn test_sweep_succeeds_on_empty_stores() {
        let job = job(MockAdminSessionStore::new());
        assert_eq!(job.frequency(), JobFrequency::Minutes(15));
        assert!(job.execute().await.is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_reported() {
        assert!(job(MockAdminSessionStore::failing()).execute().await.is_err());
    }
}
