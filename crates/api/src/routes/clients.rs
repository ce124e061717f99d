//! Admin CRM: clients.
//!
//! One path, `/api/admin/clients`, with the record selected by `?id=`.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use domain::models::client::{CreateClientRequest, UpdateClientRequest};
use domain::models::{Client, ClientDetail, ClientStatus, Inquiry};
use persistence::repositories::{ClientRepository, InquiryRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminSessionContext;
use crate::routes::SuccessResponse;

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub id: Option<i32>,
    pub status: Option<String>,
}

fn require_id(query: &ClientQuery) -> Result<i32, ApiError> {
    query
        .id
        .ok_or_else(|| ApiError::validation("Missing client id"))
}

fn parse_status(raw: Option<&str>) -> Result<Option<ClientStatus>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse().map(Some).map_err(ApiError::validation),
    }
}

fn not_found() -> ApiError {
    ApiError::NotFound("Client not found".to_string())
}

/// `GET /api/admin/clients[?status=]` lists clients; `?id=` returns one with
/// its linked inquiries.
pub async fn get_clients(
    State(state): State<AppState>,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let clients = ClientRepository::new(state.pool.clone());

    if let Some(id) = query.id {
        let client: Client = clients.find_by_id(id).await?.ok_or_else(not_found)?.into();
        let inquiries: Vec<Inquiry> = InquiryRepository::new(state.pool.clone())
            .find_by_client(id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        return Ok(Json(ClientDetail { client, inquiries }).into_response());
    }

    let status = parse_status(query.status.as_deref())?;
    let list: Vec<Client> = clients
        .list(status)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(list).into_response())
}

/// `POST /api/admin/clients`.
pub async fn create_client(
    State(state): State<AppState>,
    admin: AdminSessionContext,
    payload: Result<Json<CreateClientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    let client: Client = ClientRepository::new(state.pool.clone())
        .create(&request)
        .await?
        .into();

    info!(client_id = client.id, admin = %admin.email, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

/// `PUT /api/admin/clients?id=`. Absent or null fields are left unchanged.
pub async fn update_client(
    State(state): State<AppState>,
    admin: AdminSessionContext,
    query: Result<Query<ClientQuery>, QueryRejection>,
    payload: Result<Json<UpdateClientRequest>, JsonRejection>,
) -> Result<Json<Client>, ApiError> {
    let Query(query) = query?;
    let id = require_id(&query)?;
    let Json(request) = payload?;
    request.validate()?;

    let repo = ClientRepository::new(state.pool.clone());
    let entity = if request.is_empty() {
        repo.find_by_id(id).await?
    } else {
        repo.update(id, &request).await?
    };
    let client: Client = entity.ok_or_else(not_found)?.into();

    info!(client_id = id, admin = %admin.email, "Client updated");
    Ok(Json(client))
}

/// `DELETE /api/admin/clients?id=`. Linked inquiries are kept and unlinked.
pub async fn delete_client(
    State(state): State<AppState>,
    admin: AdminSessionContext,
    query: Result<Query<ClientQuery>, QueryRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Query(query) = query?;
    let id = require_id(&query)?;

    if !ClientRepository::new(state.pool.clone()).delete(id).await? {
        return Err(not_found());
    }

    info!(client_id = id, admin = %admin.email, "Client deleted");
    Ok(Json(SuccessResponse::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some("")).unwrap(), None);
        assert_eq!(
            parse_status(Some("Active")).unwrap(),
            Some(ClientStatus::Active)
        );
        assert_eq!(
            parse_status(Some("vip")).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_require_id() {
        assert_eq!(
            require_id(&ClientQuery {
                id: Some(4),
                status: None
            })
            .unwrap(),
            4
        );
        assert!(require_id(&ClientQuery::default()).is_err());
    }
}
