//! Repository implementations for database operations.

pub mod admin_session;
pub mod client;
pub mod inquiry;
pub mod otp_code;

pub use admin_session::AdminSessionRepository;
pub use client::ClientRepository;
pub use inquiry::InquiryRepository;
pub use otp_code::OtpCodeRepository;
