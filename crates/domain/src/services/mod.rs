//! Domain services for Atelier.
//!
//! Services contain business logic that operates on domain models.

pub mod edge_filter;
pub mod stores;

pub use edge_filter::{
    BlockReason, EdgeRequest, EdgeRuleError, EdgeRuleTables, EdgeRules, EdgeVerdict, FlagReason,
};
pub use stores::{
    AdminSessionStore, InquiryStore, MockAdminSessionStore, MockInquiryStore, MockOtpCodeStore,
    OtpCodeStore,
};
