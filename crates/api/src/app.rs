use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::{AdminSessionStore, EdgeRuleError, EdgeRules, InquiryStore, OtpCodeStore};
use persistence::repositories::{AdminSessionRepository, InquiryRepository, OtpCodeRepository};

use crate::config::Config;
use crate::middleware::{
    edge_filter, metrics_handler, metrics_middleware, require_admin_session,
    security_headers_middleware, trace_id, SecurityHeaders,
};
use crate::routes::{admin_otp, clients, contact, health, inquiries, instagram};
use crate::services::email::EmailError;
use crate::services::thumbnails::ThumbnailError;
use crate::services::{AdminAuthService, ContactService, EmailService, Mailer, ThumbnailProxy};

/// Failures while assembling the application.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid edge filter rules: {0}")]
    EdgeRules(#[from] EdgeRuleError),

    #[error("Email service: {0}")]
    Email(#[from] EmailError),

    #[error("Thumbnail proxy: {0}")]
    Thumbnails(#[from] ThumbnailError),
}

/// Storage behind the auth and contact services.
#[derive(Clone)]
pub struct Stores {
    pub codes: Arc<dyn OtpCodeStore>,
    pub sessions: Arc<dyn AdminSessionStore>,
    pub inquiries: Arc<dyn InquiryStore>,
}

impl Stores {
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            codes: Arc::new(OtpCodeRepository::new(pool.clone())),
            sessions: Arc::new(AdminSessionRepository::new(pool.clone())),
            inquiries: Arc::new(InquiryRepository::new(pool.clone())),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub auth: Arc<AdminAuthService>,
    pub contact: Arc<ContactService>,
    pub thumbnails: Arc<ThumbnailProxy>,
    pub edge_rules: Arc<EdgeRules>,
}

impl AppState {
    /// Production wiring: PostgreSQL stores and the configured mail provider.
    pub fn new(config: Config, pool: PgPool) -> Result<Self, StartupError> {
        let mailer: Arc<dyn Mailer> = Arc::new(EmailService::new(config.email.clone())?);
        let stores = Stores::postgres(&pool);
        Self::from_parts(config, pool, mailer, stores)
    }

    pub fn from_parts(
        config: Config,
        pool: PgPool,
        mailer: Arc<dyn Mailer>,
        stores: Stores,
    ) -> Result<Self, StartupError> {
        let edge_rules = Arc::new(config.edge_filter.rule_tables().compile()?);
        let thumbnails = Arc::new(ThumbnailProxy::new(config.thumbnails.clone())?);

        let auth = Arc::new(AdminAuthService::new(
            &config.admin.email,
            config.admin.policy(),
            &config.site.name,
            stores.codes,
            stores.sessions,
            mailer.clone(),
        ));
        let contact = Arc::new(ContactService::new(
            config.contact_recipient(),
            config.contact.send_confirmation,
            &config.site.name,
            mailer,
            stores.inquiries,
        ));

        Ok(Self {
            pool,
            config: Arc::new(config),
            auth,
            contact,
            thumbnails,
            edge_rules,
        })
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, StartupError> {
    Ok(build_router(AppState::new(config, pool)?))
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Everything here needs a live admin session.
    let admin_routes = Router::new()
        .route(
            "/api/admin/clients",
            get(clients::get_clients)
                .post(clients::create_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/api/admin/inquiries", get(inquiries::list_inquiries))
        .route("/api/admin/inquiries/link", post(inquiries::link_inquiry))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_admin_session,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/send-email",
            post(contact::send_email).fallback(contact::method_not_allowed),
        )
        .route("/api/instagram-image", get(instagram::instagram_image))
        .route("/api/admin/otp/send", post(admin_otp::send_code))
        .route("/api/admin/otp/verify", post(admin_otp::verify_code))
        .route("/api/admin/otp/logout", post(admin_otp::logout));

    let mut router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .fallback_service(ServeDir::new(&config.site.static_dir))
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(body_limit(&config)))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware));

    // Runs ahead of routing, static files included.
    if config.edge_filter.enabled {
        router = router.layer(middleware::from_fn_with_state(
            state.edge_rules.clone(),
            edge_filter,
        ));
    }

    router
        .layer(middleware::from_fn_with_state(
            SecurityHeaders {
                hsts: config.security.hsts,
            },
            security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

/// Bodies are capped at the edge filter ceiling even when the filter is off
/// or the client streams without a content length.
fn body_limit(config: &Config) -> usize {
    usize::try_from(config.edge_filter.max_body_bytes).unwrap_or(usize::MAX)
}
