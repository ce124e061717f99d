//! Admin login by emailed one-time code.
//!
//! Exactly one configured address can log in. A login is two steps: request a
//! 6-digit code (valid for a short window, rate limited per address), then
//! exchange it for an opaque bearer token with a fixed lifetime. All
//! coordination lives in the stores; the service holds no mutable state.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use domain::models::{AdminSession, NewAdminSession, NewOtpCode, OtpPolicy};
use domain::services::{AdminSessionStore, OtpCodeStore};
use shared::crypto::{generate_otp_code, generate_session_token, sha256_hex, OTP_CODE_DIGITS};
use shared::validation::{is_numeric_code, normalize_email};

use crate::error::ApiError;
use crate::services::email::{login_code_email, EmailError, Mailer};

/// Errors from the admin login flow.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    #[error("Too many login codes requested")]
    RateLimited,

    /// Wrong address, wrong code, used code or expired code. Deliberately
    /// indistinguishable.
    #[error("Invalid code")]
    InvalidCode,

    #[error("Failed to deliver login code: {0}")]
    Delivery(#[from] EmailError),

    #[error("Storage error: {0}")]
    Store(#[from] sqlx::Error),
}

impl From<AdminAuthError> for ApiError {
    fn from(err: AdminAuthError) -> Self {
        match err {
            AdminAuthError::RateLimited => ApiError::RateLimited,
            AdminAuthError::InvalidCode => ApiError::Unauthorized("Invalid code".to_string()),
            AdminAuthError::Delivery(e) => ApiError::Internal(format!("Login code email: {}", e)),
            AdminAuthError::Store(e) => ApiError::Internal(format!("Admin auth storage: {}", e)),
        }
    }
}

/// A freshly issued session. The plaintext token is only ever held here.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds.
    pub expires_in: i64,
}

/// Result of a housekeeping sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub sessions: u64,
    pub codes: u64,
}

pub struct AdminAuthService {
    admin_email: String,
    policy: OtpPolicy,
    site_name: String,
    codes: Arc<dyn OtpCodeStore>,
    sessions: Arc<dyn AdminSessionStore>,
    mailer: Arc<dyn Mailer>,
}

impl AdminAuthService {
    pub fn new(
        admin_email: &str,
        policy: OtpPolicy,
        site_name: &str,
        codes: Arc<dyn OtpCodeStore>,
        sessions: Arc<dyn AdminSessionStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            admin_email: normalize_email(admin_email),
            policy,
            site_name: site_name.to_string(),
            codes,
            sessions,
            mailer,
        }
    }

    pub fn policy(&self) -> &OtpPolicy {
        &self.policy
    }

    pub async fn request_code(&self, email: &str) -> Result<(), AdminAuthError> {
        self.request_code_at(email, Utc::now()).await
    }

    /// Issues and mails a login code if `email` is the admin address.
    ///
    /// Any other address is a silent no-op so callers cannot probe for the
    /// admin account.
    pub async fn request_code_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AdminAuthError> {
        let email = normalize_email(email);
        if email != self.admin_email {
            debug!("Login code requested for a non-admin address");
            return Ok(());
        }

        let window_start = now - self.policy.rate_window;
        let issued = self.codes.count_issued_since(&email, window_start).await?;
        if issued >= self.policy.max_codes_per_window {
            warn!(issued, "Login code rate limit reached");
            return Err(AdminAuthError::RateLimited);
        }

        // Codes still inside the rate window are kept so they keep counting.
        match self.codes.purge_expired(now, window_start).await {
            Ok(purged) if purged > 0 => debug!(purged, "Purged expired login codes"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge expired login codes"),
        }

        let code = generate_otp_code();
        self.codes
            .insert(&NewOtpCode {
                email: email.clone(),
                code: code.clone(),
                created_at: now,
                expires_at: now + self.policy.code_ttl,
            })
            .await?;

        self.mailer
            .send(login_code_email(
                &email,
                &code,
                self.policy.code_ttl.num_minutes(),
                &self.site_name,
            ))
            .await?;

        info!("Login code issued");
        Ok(())
    }

    pub async fn verify_code(&self, email: &str, code: &str) -> Result<IssuedSession, AdminAuthError> {
        self.verify_code_at(email, code, Utc::now()).await
    }

    /// Redeems a login code and mints a session.
    ///
    /// The code is consumed by a single conditional update, so a replay or a
    /// concurrent second redemption finds nothing to consume.
    pub async fn verify_code_at(
        &self,
        email: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AdminAuthError> {
        let email = normalize_email(email);
        let code = code.trim();
        if email != self.admin_email || !is_numeric_code(code, OTP_CODE_DIGITS as usize) {
            return Err(AdminAuthError::InvalidCode);
        }

        if self.codes.consume(&email, code, now).await?.is_none() {
            info!("Login code rejected");
            return Err(AdminAuthError::InvalidCode);
        }

        match self.sessions.purge_expired(now).await {
            Ok(purged) if purged > 0 => debug!(purged, "Purged expired admin sessions"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Failed to purge expired admin sessions"),
        }

        let token = generate_session_token();
        let expires_at = now + self.policy.session_ttl;
        self.sessions
            .insert(&NewAdminSession {
                token_hash: sha256_hex(&token),
                email,
                created_at: now,
                expires_at,
            })
            .await?;

        info!(expires_at = %expires_at, "Admin session created");
        Ok(IssuedSession {
            token,
            expires_at,
            expires_in: self.policy.session_ttl.num_seconds(),
        })
    }

    pub async fn authenticate(&self, token: &str) -> Result<Option<AdminSession>, AdminAuthError> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// Looks up the live session for a bearer token. Sessions do not slide:
    /// the expiry is fixed at issuance.
    pub async fn authenticate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AdminSession>, AdminAuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.sessions.find_active(&sha256_hex(token), now).await?)
    }

    /// Ends the session for `token`, if any. Never fails.
    pub async fn logout(&self, token: Option<&str>) {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        match self.sessions.delete_by_token_hash(&sha256_hex(token)).await {
            Ok(true) => info!("Admin session ended"),
            Ok(false) => debug!("Logout for unknown session"),
            Err(e) => warn!(error = %e, "Failed to delete admin session on logout"),
        }
    }

    /// Deletes expired sessions and codes that no longer count toward the
    /// rate limit.
    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> Result<SweepResult, AdminAuthError> {
        let sessions = self.sessions.purge_expired(now).await?;
        let codes = self
            .codes
            .purge_expired(now, now - self.policy.rate_window)
            .await?;
        Ok(SweepResult { sessions, codes })
    }
}
