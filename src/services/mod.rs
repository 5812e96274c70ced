//! Business logic layer.
//!
//! Services contain the core business logic, separate from HTTP handlers.

/// Key rotation, usage accounting and credential administration
pub mod credential_service;
/// Daily usage counter reset task
pub mod quota_scheduler;
/// Credential selection and usage aggregation
pub mod selector;
/// Admin user bootstrap
pub mod user_service;
