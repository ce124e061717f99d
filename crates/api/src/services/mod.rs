//! Application services and external integrations.

pub mod admin_auth;
pub mod contact;
pub mod email;
pub mod thumbnails;

pub use admin_auth::{AdminAuthError, AdminAuthService, IssuedSession};
pub use contact::{ContactError, ContactOutcome, ContactService};
pub use email::{EmailService, Mailer};
pub use thumbnails::{Thumbnail, ThumbnailProxy};
