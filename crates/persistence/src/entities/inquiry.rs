//! Inquiry entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::{Inquiry, InquiryWithClient};

/// Database row mapping for the inquiries table.
#[derive(Debug, Clone, FromRow)]
pub struct InquiryEntity {
    pub id: i32,
    pub client_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub company: Option<String>,
    pub budget: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<InquiryEntity> for Inquiry {
    fn from(entity: InquiryEntity) -> Self {
        Self {
            id: entity.id,
            client_id: entity.client_id,
            name: entity.name,
            email: entity.email,
            company: entity.company,
            budget: entity.budget,
            message: entity.message,
            created_at: entity.created_at,
        }
    }
}

/// Inquiry row joined with the linked client's name.
#[derive(Debug, Clone, FromRow)]
pub struct InquiryWithClientEntity {
    #[sqlx(flatten)]
    pub inquiry: InquiryEntity,
    pub client_name: Option<String>,
}

impl From<InquiryWithClientEntity> for InquiryWithClient {
    fn from(entity: InquiryWithClientEntity) -> Self {
        Self {
            inquiry: entity.inquiry.into(),
            client_name: entity.client_name,
        }
    }
}
