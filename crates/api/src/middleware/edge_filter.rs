//! Edge request filter.
//!
//! Runs ahead of routing, on every request including static files. Rejections
//! carry the usual JSON error body; probes for blocked files and paths get a
//! plain not-found so they look like any missing page.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use domain::services::{BlockReason, EdgeRequest, EdgeRules, EdgeVerdict};

use crate::error::ApiError;
use crate::middleware::metrics::{record_edge_block, record_edge_flag};

pub async fn edge_filter(
    State(rules): State<Arc<EdgeRules>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let verdict = {
        let header_names: Vec<&str> = req.headers().keys().map(|k| k.as_str()).collect();
        let request = EdgeRequest {
            method: req.method().as_str(),
            path: req.uri().path(),
            query: req.uri().query(),
            user_agent: req
                .headers()
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok()),
            header_names: &header_names,
            content_length: req
                .headers()
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok()),
        };
        rules.evaluate(&request)
    };

    match verdict {
        EdgeVerdict::Allow => next.run(req).await,
        EdgeVerdict::AllowFlagged(reason) => {
            info!(
                reason = reason.as_str(),
                method = %req.method(),
                path = %req.uri().path(),
                user_agent = user_agent(&req),
                "Edge filter flagged request"
            );
            record_edge_flag(reason.as_str());
            next.run(req).await
        }
        EdgeVerdict::Block(reason) => {
            warn!(
                reason = reason.as_str(),
                method = %req.method(),
                path = %req.uri().path(),
                query = req.uri().query().unwrap_or_default(),
                user_agent = user_agent(&req),
                "Edge filter blocked request"
            );
            record_edge_block(reason.as_str());
            rejection(reason).into_response()
        }
    }
}

fn user_agent(req: &Request<Body>) -> &str {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn rejection(reason: BlockReason) -> ApiError {
    match reason {
        BlockReason::OversizedBody => ApiError::PayloadTooLarge,
        BlockReason::BlockedExtension | BlockReason::BlockedPath => {
            ApiError::NotFound("Not found".to_string())
        }
        BlockReason::SuspiciousQuery | BlockReason::SuspiciousHeader => {
            ApiError::validation("Bad request")
        }
        BlockReason::MaliciousUserAgent => ApiError::Forbidden("Forbidden".to_string()),
        BlockReason::MethodNotAllowed | BlockReason::PostNotAllowed => ApiError::MethodNotAllowed,
    }
}
