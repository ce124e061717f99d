//! Public contact form endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use domain::models::ContactSubmission;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_contact_submission;
use crate::routes::SuccessResponse;
use crate::services::{ContactError, ContactOutcome};

/// `POST /api/send-email`.
///
/// Discarded submissions (honeypot, spam) get the same `{success: true}` as
/// delivered ones.
pub async fn send_email(
    State(state): State<AppState>,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Result<Json<SuccessResponse>, ApiError> {
    let Json(submission) = payload?;

    match state.contact.submit(&submission).await {
        Ok(ContactOutcome::Delivered) => record_contact_submission("delivered"),
        Ok(ContactOutcome::Discarded(reason)) => record_contact_submission(reason.as_str()),
        Err(e) => {
            record_contact_submission(match e {
                ContactError::Delivery(_) => "failed",
                _ => "invalid",
            });
            return Err(e.into());
        }
    }

    Ok(Json(SuccessResponse::ok()))
}

/// Any other method on the contact endpoint.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
