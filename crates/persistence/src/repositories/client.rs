//! Client repository for database operations.

use sqlx::PgPool;

use domain::models::client::{ClientStatus, CreateClientRequest, UpdateClientRequest};

use crate::entities::ClientEntity;
use crate::metrics::QueryTimer;

/// Repository for CRM clients.
#[derive(Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    /// Creates a new ClientRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists clients, most recently created first.
    pub async fn list(&self, status: Option<ClientStatus>) -> Result<Vec<ClientEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_clients");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            SELECT * FROM clients
            WHERE ($1::TEXT IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find client by ID.
    pub async fn find_by_id(&self, id: i32) -> Result<Option<ClientEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_client_by_id");
        let result = sqlx::query_as::<_, ClientEntity>("SELECT * FROM clients WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Create a new client.
    pub async fn create(&self, req: &CreateClientRequest) -> Result<ClientEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_client");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            INSERT INTO clients (name, email, phone, company, status, budget, deadline, cost, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(req.name.trim())
        .bind(&req.email)
        .bind(&req.phone)
        .bind(&req.company)
        .bind(req.status.as_str())
        .bind(&req.budget)
        .bind(req.deadline)
        .bind(req.cost)
        .bind(&req.notes)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Applies a partial update. Returns `None` if the client does not exist.
    ///
    /// Each optional column takes a presence flag and a value, so an explicit
    /// `null` in the request clears it.
    pub async fn update(
        &self,
        id: i32,
        req: &UpdateClientRequest,
    ) -> Result<Option<ClientEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_client");
        let result = sqlx::query_as::<_, ClientEntity>(
            r#"
            UPDATE clients SET
                name = COALESCE($2, name),
                status = COALESCE($3, status),
                email = CASE WHEN $4::boolean THEN $5::TEXT ELSE email END,
                phone = CASE WHEN $6::boolean THEN $7::TEXT ELSE phone END,
                company = CASE WHEN $8::boolean THEN $9::TEXT ELSE company END,
                budget = CASE WHEN $10::boolean THEN $11::TEXT ELSE budget END,
                deadline = CASE WHEN $12::boolean THEN $13::DATE ELSE deadline END,
                cost = CASE WHEN $14::boolean THEN $15::DOUBLE PRECISION ELSE cost END,
                notes = CASE WHEN $16::boolean THEN $17::TEXT ELSE notes END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(req.status.map(|s| s.as_str()))
        .bind(req.email.is_some())
        .bind(inner_text(&req.email))
        .bind(req.phone.is_some())
        .bind(inner_text(&req.phone))
        .bind(req.company.is_some())
        .bind(inner_text(&req.company))
        .bind(req.budget.is_some())
        .bind(inner_text(&req.budget))
        .bind(req.deadline.is_some())
        .bind(req.deadline.flatten())
        .bind(req.cost.is_some())
        .bind(req.cost.flatten())
        .bind(req.notes.is_some())
        .bind(inner_text(&req.notes))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Deletes a client and clears the link on its inquiries in one
    /// transaction. Returns false if the client did not exist.
    pub async fn delete(&self, id: i32) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_client");
        let mut tx = self.pool.begin().await?;

        let unlinked = sqlx::query("UPDATE inquiries SET client_id = NULL WHERE client_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let deleted = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        timer.record();

        if deleted > 0 {
            tracing::debug!(client_id = id, unlinked_inquiries = unlinked, "Client deleted");
        }
        Ok(deleted > 0)
    }
}

fn inner_text(field: &Option<Option<String>>) -> Option<&str> {
    field.as_ref().and_then(|v| v.as_deref())
}
