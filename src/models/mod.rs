//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables.

/// Rotatable provider credentials and their request/response types
pub mod credential;
/// Providers a credential can belong to
pub mod provider;
/// Callers of the API and their roles
pub mod user;
