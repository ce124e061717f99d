//! Inquiry repository for database operations.

use sqlx::PgPool;

use domain::models::{Inquiry, InquiryFilter, NewInquiry};
use domain::services::InquiryStore;

use crate::entities::{InquiryEntity, InquiryWithClientEntity};
use crate::metrics::QueryTimer;

const INQUIRY_COLUMNS: &str =
    "i.id, i.client_id, i.name, i.email, i.company, i.budget, i.message, i.created_at";

/// Repository for contact inquiries.
#[derive(Clone)]
pub struct InquiryRepository {
    pool: PgPool,
}

impl InquiryRepository {
    /// Creates a new InquiryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists inquiries newest first, with the linked client's name.
    pub async fn list(
        &self,
        filter: InquiryFilter,
    ) -> Result<Vec<InquiryWithClientEntity>, sqlx::Error> {
        let condition = match filter {
            InquiryFilter::All => "TRUE",
            InquiryFilter::Client(_) => "i.client_id = $1",
            InquiryFilter::Unlinked => "i.client_id IS NULL",
        };
        let sql = format!(
            r#"
            SELECT {INQUIRY_COLUMNS}, c.name AS client_name
            FROM inquiries i
            LEFT JOIN clients c ON c.id = i.client_id
            WHERE {condition}
            ORDER BY i.created_at DESC, i.id DESC
            "#
        );

        let timer = QueryTimer::new("list_inquiries");
        let mut query = sqlx::query_as::<_, InquiryWithClientEntity>(&sql);
        if let InquiryFilter::Client(client_id) = filter {
            query = query.bind(client_id);
        }
        let result = query.fetch_all(&self.pool).await;
        timer.record();
        result
    }

    /// Inquiries linked to a client, newest first.
    pub async fn find_by_client(&self, client_id: i32) -> Result<Vec<InquiryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_inquiries_by_client");
        let sql = format!(
            "SELECT {INQUIRY_COLUMNS} FROM inquiries i WHERE i.client_id = $1 ORDER BY i.created_at DESC"
        );
        let result = sqlx::query_as::<_, InquiryEntity>(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Sets or clears an inquiry's client link. Returns `None` if the inquiry
    /// does not exist.
    pub async fn set_client(
        &self,
        inquiry_id: i32,
        client_id: Option<i32>,
    ) -> Result<Option<InquiryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("link_inquiry");
        let result = sqlx::query_as::<_, InquiryEntity>(
            r#"
            UPDATE inquiries SET client_id = $2
            WHERE id = $1
            RETURNING id, client_id, name, email, company, budget, message, created_at
            "#,
        )
        .bind(inquiry_id)
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[async_trait::async_trait]
impl InquiryStore for InquiryRepository {
    async fn record(&self, inquiry: &NewInquiry) -> Result<Inquiry, sqlx::Error> {
        let timer = QueryTimer::new("insert_inquiry");
        let result = sqlx::query_as::<_, InquiryEntity>(
            r#"
            INSERT INTO inquiries (name, email, company, budget, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, client_id, name, email, company, budget, message, created_at
            "#,
        )
        .bind(&inquiry.name)
        .bind(&inquiry.email)
        .bind(&inquiry.company)
        .bind(&inquiry.budget)
        .bind(&inquiry.message)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result.map(Into::into)
    }
}
