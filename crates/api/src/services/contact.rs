//! Public contact form handling.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use validator::{Validate, ValidationErrors};

use domain::models::ContactSubmission;
use domain::services::InquiryStore;
use shared::validation::is_valid_email;

use crate::error::ApiError;
use crate::services::email::{
    inquiry_confirmation_email, inquiry_notification_email, EmailError, InquiryDetails, Mailer,
};

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("Invalid submission: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Failed to deliver inquiry: {0}")]
    Delivery(#[from] EmailError),
}

impl From<ContactError> for ApiError {
    fn from(err: ContactError) -> Self {
        match err {
            ContactError::Invalid(errors) => errors.into(),
            ContactError::InvalidEmail => ApiError::validation("Invalid email address"),
            ContactError::Delivery(e) => ApiError::Internal(format!("Inquiry notification: {}", e)),
        }
    }
}

/// Why a submission was accepted without being delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    Honeypot,
    Spam,
}

impl DiscardReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscardReason::Honeypot => "honeypot",
            DiscardReason::Spam => "spam",
        }
    }
}

/// Both outcomes look identical to the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    Delivered,
    Discarded(DiscardReason),
}

pub struct ContactService {
    recipient: String,
    send_confirmation: bool,
    site_name: String,
    mailer: Arc<dyn Mailer>,
    inquiries: Arc<dyn InquiryStore>,
}

impl ContactService {
    pub fn new(
        recipient: &str,
        send_confirmation: bool,
        site_name: &str,
        mailer: Arc<dyn Mailer>,
        inquiries: Arc<dyn InquiryStore>,
    ) -> Self {
        Self {
            recipient: recipient.to_string(),
            send_confirmation,
            site_name: site_name.to_string(),
            mailer,
            inquiries,
        }
    }

    /// Screens, delivers and records one submission.
    ///
    /// Only the owner notification is load-bearing. The confirmation email and
    /// the stored inquiry are best effort.
    pub async fn submit(&self, submission: &ContactSubmission) -> Result<ContactOutcome, ContactError> {
        if submission.is_honeypot_tripped() {
            info!(reason = "honeypot", "Contact submission discarded");
            return Ok(ContactOutcome::Discarded(DiscardReason::Honeypot));
        }

        submission.validate()?;
        if !is_valid_email(&submission.email) {
            return Err(ContactError::InvalidEmail);
        }

        if submission.looks_like_spam() {
            info!(reason = "spam", "Contact submission discarded");
            return Ok(ContactOutcome::Discarded(DiscardReason::Spam));
        }

        let inquiry = submission.to_new_inquiry();
        let details = InquiryDetails {
            name: &inquiry.name,
            email: &inquiry.email,
            phone: submission.phone.as_deref(),
            company: inquiry.company.as_deref(),
            budget: inquiry.budget.as_deref(),
            message: &inquiry.message,
        };
        self.mailer
            .send(inquiry_notification_email(&self.recipient, &details))
            .await?;

        if self.send_confirmation {
            if let Err(e) = self
                .mailer
                .send(inquiry_confirmation_email(
                    &inquiry.email,
                    &inquiry.name,
                    &self.site_name,
                ))
                .await
            {
                warn!(error = %e, "Failed to send inquiry confirmation");
            }
        }

        match self.inquiries.record(&inquiry).await {
            Ok(stored) => info!(inquiry_id = stored.id, "Inquiry received"),
            Err(e) => warn!(error = %e, "Failed to store inquiry"),
        }

        Ok(ContactOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::email::MockMailer;
    use domain::services::MockInquiryStore;
    use fake::faker::internet::en::SafeEmail;
    use fake::faker::name::en::Name;
    use fake::Fake;

    const OWNER: &str = "studio@atelier.studio";

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: Name().fake(),
            email: SafeEmail().fake(),
            message: "Looking for a new identity for our bakery.".into(),
            company: Some("Crumb & Co".into()),
            ..Default::default()
        }
    }

    fn service(mailer: Arc<MockMailer>, store: Arc<MockInquiryStore>) -> ContactService {
        ContactService::new(OWNER, true, "Atelier", mailer, store)
    }

    #[tokio::test]
    async fn test_delivers_notification_confirmation_and_record() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = submission();

        let outcome = service(mailer.clone(), store.clone()).submit(&s).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Delivered);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].to, OWNER);
        assert_eq!(sent[0].reply_to.as_deref(), Some(s.email.as_str()));
        assert!(sent[0].body_html.as_deref().unwrap().contains("Crumb &amp; Co"));
        assert_eq!(sent[1].to, s.email);

        let stored = store.inquiries();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].client_id, None);
        assert_eq!(stored[0].company.as_deref(), Some("Crumb & Co"));
    }

    #[tokio::test]
    async fn test_honeypot_discards_silently() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = ContactSubmission {
            website: Some("http://spam.example".into()),
            ..submission()
        };

        let outcome = service(mailer.clone(), store.clone()).submit(&s).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded(DiscardReason::Honeypot));
        assert!(mailer.sent().is_empty());
        assert!(store.inquiries().is_empty());
    }

    #[tokio::test]
    async fn test_honeypot_wins_over_invalid_fields() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = ContactSubmission {
            website: Some("x".into()),
            ..Default::default()
        };
        let outcome = service(mailer, store).submit(&s).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded(DiscardReason::Honeypot));
    }

    #[tokio::test]
    async fn test_spam_discards_silently() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = ContactSubmission {
            message: "Boost traffic with our SEO services and backlinks".into(),
            ..submission()
        };

        let outcome = service(mailer.clone(), store.clone()).submit(&s).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Discarded(DiscardReason::Spam));
        assert!(mailer.sent().is_empty());
        assert!(store.inquiries().is_empty());
    }

    #[tokio::test]
    async fn test_missing_fields_rejected() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = ContactSubmission {
            message: String::new(),
            ..submission()
        };
        let err = service(mailer.clone(), store).submit(&s).await.unwrap_err();
        assert!(matches!(err, ContactError::Invalid(_)));
        assert_eq!(
            ApiError::from(err).status(),
            axum::http::StatusCode::BAD_REQUEST
        );
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_email_rejected() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let s = ContactSubmission {
            email: "not-an-email".into(),
            ..submission()
        };
        let err = service(mailer, store).submit(&s).await.unwrap_err();
        assert!(matches!(err, ContactError::InvalidEmail));
    }

    #[tokio::test]
    async fn test_notification_failure_is_an_error() {
        let mailer = Arc::new(MockMailer::failing_for(OWNER));
        let store = Arc::new(MockInquiryStore::new());
        let err = service(mailer, store.clone())
            .submit(&submission())
            .await
            .unwrap_err();
        assert!(matches!(err, ContactError::Delivery(_)));
        assert!(store.inquiries().is_empty());
    }

    #[tokio::test]
    async fn test_secondary_failures_are_swallowed() {
        let s = submission();
        let mailer = Arc::new(MockMailer::failing_for(&s.email));
        let store = Arc::new(MockInquiryStore::failing());

        let outcome = service(mailer.clone(), store).submit(&s).await.unwrap();
        assert_eq!(outcome, ContactOutcome::Delivered);
        assert_eq!(mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmation_can_be_disabled() {
        let mailer = Arc::new(MockMailer::new());
        let store = Arc::new(MockInquiryStore::new());
        let service = ContactService::new(OWNER, false, "Atelier", mailer.clone(), store);
        service.submit(&submission()).await.unwrap();
        assert_eq!(mailer.sent().len(), 1);
    }
}
