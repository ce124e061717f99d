//! Admin session extractors.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{DateTime, Utc};
use std::convert::Infallible;

use domain::models::AdminSession;

use crate::error::ApiError;

/// The authenticated admin, inserted by `require_admin_session`.
#[derive(Debug, Clone)]
pub struct AdminSessionContext {
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AdminSession> for AdminSessionContext {
    fn from(session: AdminSession) -> Self {
        Self {
            email: session.email,
            expires_at: session.expires_at,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSessionContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminSessionContext>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// The bearer token, if the request carried a well-formed one.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(BearerToken(bearer_token(&parts.headers)))
    }
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().trim().to_string())
        .filter(|token| !token.is_empty())
}
