//! Admin login endpoints.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use validator::Validate;

use domain::models::admin_auth::{
    SendCodeRequest, SendCodeResponse, SessionTokenResponse, VerifyCodeRequest,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::BearerToken;
use crate::routes::SuccessResponse;

/// `POST /api/admin/otp/send`. The response never says whether the address
/// belongs to the admin.
pub async fn send_code(
    State(state): State<AppState>,
    payload: Result<Json<SendCodeRequest>, JsonRejection>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    let Json(request) = payload?;
    request.validate()?;

    state.auth.request_code(&request.email).await?;

    Ok(Json(SendCodeResponse { sent: true }))
}

/// `POST /api/admin/otp/verify`.
pub async fn verify_code(
    State(state): State<AppState>,
    payload: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> Result<Json<SessionTokenResponse>, ApiError> {
    let Json(request) = payload?;

    let session = state
        .auth
        .verify_code(&request.email, &request.code)
        .await?;

    Ok(Json(SessionTokenResponse {
        token: session.token,
        expires_in: session.expires_in,
    }))
}

/// `POST /api/admin/otp/logout`. Succeeds with any token or none.
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Json<SuccessResponse> {
    state.auth.logout(token.as_deref()).await;
    Json(SuccessResponse::ok())
}
