//! HTTP middleware components.

pub mod admin_auth;
pub mod edge_filter;
pub mod logging;
pub mod metrics;
pub mod security_headers;
pub mod trace_id;

pub use admin_auth::require_admin_session;
pub use edge_filter::edge_filter;
pub use metrics::{init_metrics, metrics_handler, metrics_middleware};
pub use security_headers::{security_headers_middleware, SecurityHeaders};
pub use trace_id::{trace_id, RequestId, REQUEST_ID_HEADER};
