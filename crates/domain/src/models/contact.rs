//! Public contact form submission.

use serde::Deserialize;
use validator::Validate;

use super::inquiry::NewInquiry;

lazy_static::lazy_static! {
    /// Phrases that only ever show up in unsolicited marketing and bot traffic.
    static ref SPAM_REGEX: regex::Regex = regex::Regex::new(
        r"(?i)\b(viagra|cialis|casino|poker|lottery|bitcoin|crypto\s*currency|forex|payday\s+loan|loan\s+offer|seo\s+(services|agency|expert)|backlinks?|guest\s+post|rank\s+your\s+(site|website)|buy\s+now|click\s+here|make\s+money\s+fast|porn|xxx)\b|\[url=|<a\s+href",
    )
    .unwrap();
}

/// JSON body of `POST /api/send-email`.
///
/// `website` is a honeypot hidden from humans; anything in it marks the
/// submission as automated.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ContactSubmission {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 100, message = "Name is required (max 100 characters)"),
        custom(function = "shared::validation::validate_not_blank", message = "Name is required")
    )]
    pub name: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(
        length(min = 1, max = 5000, message = "Message is required (max 5000 characters)"),
        custom(function = "shared::validation::validate_not_blank", message = "Message is required")
    )]
    pub message: String,

    #[validate(length(max = 50, message = "Phone must be at most 50 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<String>,

    #[validate(length(max = 100, message = "Budget must be at most 100 characters"))]
    pub budget: Option<String>,

    pub website: Option<String>,
}

impl ContactSubmission {
    /// True when the honeypot field has been filled in.
    pub fn is_honeypot_tripped(&self) -> bool {
        self.website
            .as_deref()
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    /// True when the name, company or message contains a spam signature.
    pub fn looks_like_spam(&self) -> bool {
        SPAM_REGEX.is_match(&self.message)
            || SPAM_REGEX.is_match(&self.name)
            || self
                .company
                .as_deref()
                .map(|c| SPAM_REGEX.is_match(c))
                .unwrap_or(false)
    }

    /// Builds the inquiry record stored after a successful submission.
    pub fn to_new_inquiry(&self) -> NewInquiry {
        NewInquiry {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            company: non_blank(self.company.as_deref()),
            budget: non_blank(self.budget.as_deref()),
            message: self.message.trim().to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
