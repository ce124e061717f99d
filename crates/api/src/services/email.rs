//! Email service for login codes and contact form notifications.
//!
//! Supports two providers:
//! - `console`: Logs emails to console (development)
//! - `resend`: Sends through the Resend HTTP API

use crate::config::EmailConfig;
use shared::validation::escape_html;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    /// Recipient email address
    pub to: String,
    /// Address replies should go to (optional)
    pub reply_to: Option<String>,
    /// Email subject
    pub subject: String,
    /// Plain text body
    pub body_text: String,
    /// HTML body (optional)
    pub body_html: Option<String>,
}

/// Anything that can deliver an [`EmailMessage`].
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmailError::SendFailed(format!("HTTP client setup failed: {}", e)))?;
        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.config.sender_name, self.config.sender_email)
    }

    /// Console provider - logs emails instead of sending.
    async fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "Email (console provider)"
        );
        info!(body = %message.body_text, "Email body (text)");
        if let Some(html) = &message.body_html {
            debug!(body_html_length = html.len(), "Email body (HTML)");
        }
        Ok(())
    }

    /// Resend provider - sends via the Resend HTTP API.
    async fn send_resend(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let mut body = serde_json::json!({
            "from": self.from_header(),
            "to": [message.to],
            "subject": message.subject,
            "text": message.body_text,
        });
        if let Some(html) = &message.body_html {
            body["html"] = serde_json::json!(html);
        }
        if let Some(reply_to) = &message.reply_to {
            body["reply_to"] = serde_json::json!(reply_to);
        }

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("Resend request failed: {}", e)))?;

        if response.status().is_success() {
            info!(
                to = %message.to,
                subject = %message.subject,
                "Email sent via Resend"
            );
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(
                status = %status,
                error = %error_body,
                "Resend API error"
            );
            Err(EmailError::ProviderError(format!(
                "Resend returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait::async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message).await,
            "resend" => self.send_resend(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }
}

/// Mailer that records messages in memory, for development and testing.
#[derive(Debug, Default)]
pub struct MockMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail_for: Option<String>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mailer that fails every send.
    pub fn failing() -> Self {
        Self {
            fail_for: Some(String::new()),
            ..Self::default()
        }
    }

    /// A mailer that fails only for messages addressed to `recipient`.
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Mailer for MockMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if let Some(target) = &self.fail_for {
            if target.is_empty() || *target == message.to {
                return Err(EmailError::SendFailed("mock failure".to_string()));
            }
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }
}

/// The admin login code email.
pub fn login_code_email(to: &str, code: &str, ttl_minutes: i64, site_name: &str) -> EmailMessage {
    let body_text = format!(
        "Your {site} admin login code is {code}.\n\n\
         It expires in {ttl} minutes and can be used once.\n\n\
         If you did not request this code, you can ignore this email.",
        site = site_name,
        code = code,
        ttl = ttl_minutes
    );
    let body_html = format!(
        r#"<div style="font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; color: #222; max-width: 480px;">
    <p>Your {site} admin login code:</p>
    <p style="font-size: 32px; letter-spacing: 6px; font-weight: bold;">{code}</p>
    <p style="color: #666; font-size: 14px;">It expires in {ttl} minutes and can be used once.</p>
</div>"#,
        site = escape_html(site_name),
        code = code,
        ttl = ttl_minutes
    );
    EmailMessage {
        to: to.to_string(),
        reply_to: None,
        subject: format!("{} login code: {}", site_name, code),
        body_text,
        body_html: Some(body_html),
    }
}

/// Fields of a contact submission rendered into the owner notification.
#[derive(Debug, Clone, Copy)]
pub struct InquiryDetails<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub company: Option<&'a str>,
    pub budget: Option<&'a str>,
    pub message: &'a str,
}

/// The notification sent to the site owner. Every user value is HTML-escaped.
pub fn inquiry_notification_email(to: &str, details: &InquiryDetails<'_>) -> EmailMessage {
    let optional = |label: &str, value: Option<&str>| -> (String, String) {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) => (
                format!("{}: {}\n", label, v),
                format!(
                    "<tr><th align=\"left\">{}</th><td>{}</td></tr>",
                    label,
                    escape_html(v)
                ),
            ),
            None => (String::new(), String::new()),
        }
    };
    let (phone_text, phone_html) = optional("Phone", details.phone);
    let (company_text, company_html) = optional("Company", details.company);
    let (budget_text, budget_html) = optional("Budget", details.budget);

    let body_text = format!(
        "New inquiry from {name} <{email}>\n{phone}{company}{budget}\n{message}\n",
        name = details.name,
        email = details.email,
        phone = phone_text,
        company = company_text,
        budget = budget_text,
        message = details.message
    );
    let body_html = format!(
        r#"<h2>New inquiry</h2>
<table>
<tr><th align="left">Name</th><td>{name}</td></tr>
<tr><th align="left">Email</th><td>{email}</td></tr>
{phone}{company}{budget}
</table>
<p style="white-space: pre-wrap;">{message}</p>"#,
        name = escape_html(details.name),
        email = escape_html(details.email),
        phone = phone_html,
        company = company_html,
        budget = budget_html,
        message = escape_html(details.message)
    );

    EmailMessage {
        to: to.to_string(),
        reply_to: Some(details.email.to_string()),
        subject: format!("New inquiry from {}", details.name),
        body_text,
        body_html: Some(body_html),
    }
}

/// The acknowledgement sent back to the person who submitted the form.
pub fn inquiry_confirmation_email(to: &str, name: &str, site_name: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        reply_to: None,
        subject: format!("Thanks for getting in touch with {}", site_name),
        body_text: format!(
            "Hi {name},\n\nThanks for your message. We'll get back to you within a couple of working days.\n\n{site}",
            name = name,
            site = site_name
        ),
        body_html: Some(format!(
            "<p>Hi {name},</p><p>Thanks for your message. We'll get back to you within a couple of working days.</p><p>{site}</p>",
            name = escape_html(name),
            site = escape_html(site_name)
        )),
    }
}
