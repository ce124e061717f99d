//! Client entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use domain::models::{Client, ClientStatus};

/// Database row mapping for the clients table.
#[derive(Debug, Clone, FromRow)]
pub struct ClientEntity {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: String,
    pub budget: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub cost: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClientEntity> for Client {
    fn from(entity: ClientEntity) -> Self {
        let status = entity.status.parse().unwrap_or_else(|_| {
            tracing::warn!(client_id = entity.id, status = %entity.status, "Unknown client status in database");
            ClientStatus::default()
        });
        Self {
            id: entity.id,
            name: entity.name,
            email: entity.email,
            phone: entity.phone,
            company: entity.company,
            status,
            budget: entity.budget,
            deadline: entity.deadline,
            cost: entity.cost,
            notes: entity.notes,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
