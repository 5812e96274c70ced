//! HTTP middleware components.
//!
//! Middleware are functions that run before route handlers. Here they
//! authenticate callers and short-circuit requests without a valid token.

/// Bearer token authentication middleware
pub mod auth;
