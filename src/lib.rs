//! Credential rotation service.
//!
//! Stores outbound provider API keys (Brevo, Gemini), hands out the next
//! usable key under per-key daily quotas, counts each use, and resets the
//! counters daily.

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
