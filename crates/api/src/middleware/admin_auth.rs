//! Bearer session guard for the admin API.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::extractors::{bearer_token, AdminSessionContext};
use crate::services::AdminAuthService;

/// Rejects the request with 401 unless it carries a live session token. The
/// session is stored in request extensions for `AdminSessionContext`.
pub async fn require_admin_session(
    State(auth): State<Arc<AdminAuthService>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return ApiError::Unauthorized("Authentication required".to_string()).into_response();
    };

    match auth.authenticate(&token).await {
        Ok(Some(session)) => {
            req.extensions_mut()
                .insert(AdminSessionContext::from(session));
            next.run(req).await
        }
        Ok(None) => {
            ApiError::Unauthorized("Invalid or expired session".to_string()).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
