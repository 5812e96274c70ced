//! HTTP request handlers.
//!
//! Handlers extract request data, call the service layer, and shape the
//! JSON responses.

/// Admin-only credential management
pub mod credentials;
/// Health check endpoint
pub mod health;
/// Key acquisition for provider callers
pub mod keys;
