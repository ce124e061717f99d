//! Inquiry domain models.
//!
//! An inquiry is created by a public contact form submission and may later be
//! linked to a client from the admin panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a stored contact inquiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Inquiry {
    pub id: i32,
    pub client_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub budget: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Inquiry row for admin listings, carrying the linked client's name.
#[derive(Debug, Clone, Serialize)]
pub struct InquiryWithClient {
    #[serde(flatten)]
    pub inquiry: Inquiry,
    pub client_name: Option<String>,
}

/// Data for recording a new inquiry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInquiry {
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub budget: Option<String>,
    pub message: String,
}

/// Which inquiries an admin listing should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InquiryFilter {
    #[default]
    All,
    Client(i32),
    Unlinked,
}

/// Request to set or clear an inquiry's client link.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkInquiryRequest {
    pub inquiry_id: i32,
    #[serde(default)]
    pub client_id: Option<i32>,
}
