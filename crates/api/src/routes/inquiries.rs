//! Admin CRM: inquiries.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use domain::models::inquiry::LinkInquiryRequest;
use domain::models::{Inquiry, InquiryFilter, InquiryWithClient};
use persistence::repositories::{ClientRepository, InquiryRepository};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminSessionContext;

#[derive(Debug, Default, Deserialize)]
pub struct InquiryQuery {
    pub client_id: Option<i32>,
    #[serde(default)]
    pub unlinked: Option<bool>,
}

impl InquiryQuery {
    fn filter(&self) -> Result<InquiryFilter, ApiError> {
        match (self.client_id, self.unlinked.unwrap_or(false)) {
            (Some(_), true) => Err(ApiError::validation(
                "Use either client_id or unlinked, not both",
            )),
            (Some(id), false) => Ok(InquiryFilter::Client(id)),
            (None, true) => Ok(InquiryFilter::Unlinked),
            (None, false) => Ok(InquiryFilter::All),
        }
    }
}

/// `GET /api/admin/inquiries[?client_id=|?unlinked=true]`, newest first.
pub async fn list_inquiries(
    State(state): State<AppState>,
    query: Result<Query<InquiryQuery>, QueryRejection>,
) -> Result<Json<Vec<InquiryWithClient>>, ApiError> {
    let Query(query) = query?;
    let filter = query.filter()?;

    let inquiries = InquiryRepository::new(state.pool.clone())
        .list(filter)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(inquiries))
}

/// `POST /api/admin/inquiries/link`. A null `client_id` clears the link.
pub async fn link_inquiry(
    State(state): State<AppState>,
    admin: AdminSessionContext,
    payload: Result<Json<LinkInquiryRequest>, JsonRejection>,
) -> Result<Json<Inquiry>, ApiError> {
    let Json(request) = payload?;

    if let Some(client_id) = request.client_id {
        ClientRepository::new(state.pool.clone())
            .find_by_id(client_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Client not found".to_string()))?;
    }

    let inquiry: Inquiry = InquiryRepository::new(state.pool.clone())
        .set_client(request.inquiry_id, request.client_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Inquiry not found".to_string()))?
        .into();

    info!(
        inquiry_id = inquiry.id,
        client_id = ?inquiry.client_id,
        admin = %admin.email,
        "Inquiry link updated"
    );
    Ok(Json(inquiry))
}
