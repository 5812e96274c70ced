//! Credential data models and API request/response types.
//!
//! This module defines:
//! - `Credential`: Database entity holding one provider API key and its quota state
//! - `QuotaKey`: The capability the selector needs from any credential-like record
//! - Request bodies for creating and updating credentials
//! - `CredentialResponse` / `CredentialListItem`: What clients get back

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::provider::Provider;
use crate::error::AppError;

/// Represents a credential record from the database.
///
/// # Database Table
///
/// Maps to the `credentials` table. Each credential:
/// - Belongs to exactly one provider
/// - Is tried in ascending `sort_order` (unique per provider)
/// - Counts its own uses until the next daily reset
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Credential {
    pub id: Uuid,

    pub provider: Provider,

    /// Raw provider secret.
    ///
    /// Only the admin list view and the key-acquisition endpoints return it;
    /// every other surface shows `mask_api_key(&api_key)`.
    pub api_key: String,

    /// Optional human-readable name. Listed as "Key N" when absent.
    pub label: Option<String>,

    /// Inactive keys are never selected.
    pub is_active: bool,

    /// Calls made with this key since the last reset.
    pub usage_count: i64,

    /// Maximum calls per day, `None` for unlimited keys.
    pub daily_limit: Option<i64>,

    /// Lower values are tried first.
    pub sort_order: i32,

    pub last_used_at: Option<DateTime<Utc>>,

    pub last_reset_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Quota state shared by every rotatable credential.
///
/// The selector only ever looks at a record through this trait, so snapshots
/// loaded from other sources can be ranked the same way as database rows.
pub trait QuotaKey {
    fn is_active(&self) -> bool;
    fn usage_count(&self) -> i64;
    fn daily_limit(&self) -> Option<i64>;
    fn sort_order(&self) -> i32;
    fn created_at(&self) -> DateTime<Utc>;

    /// True when the key may serve one more call today.
    fn has_capacity(&self) -> bool {
        match self.daily_limit() {
            Some(limit) => self.usage_count() < limit,
            None => true,
        }
    }

    /// Calls left before the limit, `None` for unlimited keys.
    fn remaining(&self) -> Option<i64> {
        self.daily_limit()
            .map(|limit| (limit - self.usage_count()).max(0))
    }
}

impl QuotaKey for Credential {
    fn is_active(&self) -> bool {
        self.is_active
    }

    fn usage_count(&self) -> i64 {
        self.usage_count
    }

    fn daily_limit(&self) -> Option<i64> {
        self.daily_limit
    }

    fn sort_order(&self) -> i32 {
        self.sort_order
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Request body for adding a credential to a provider.
///
/// # JSON Example
///
/// ```json
/// {
///   "api_key": "xkeysib-0123456789abcdef",
///   "label": "Marketing account",
///   "daily_limit": 300
/// }
/// ```
///
/// # Validation
///
/// - `api_key`: Required, must not be blank
/// - `label`: Optional
/// - `daily_limit`: Optional, must be positive; defaults per provider
/// - `sort_order`: Optional, defaults to one past the provider's current maximum
#[derive(Debug, Deserialize)]
pub struct CreateCredentialRequest {
    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub daily_limit: Option<i64>,

    #[serde(default)]
    pub sort_order: Option<i32>,
}

impl CreateCredentialRequest {
    /// Check the request and return the trimmed secret and label.
    ///
    /// Runs before any database access so an invalid request never inserts a row.
    pub fn validate(&self) -> Result<(String, Option<String>), AppError> {
        let api_key = self.api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::Validation("api_key must not be empty".to_string()));
        }

        validate_daily_limit(self.daily_limit)?;

        let label = self
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);

        Ok((api_key.to_string(), label))
    }
}

/// Request body for patching a credential.
///
/// Every field is optional; absent fields are left untouched. A JSON `null`
/// reads the same as an absent field, so removing a limit takes the explicit
/// `clear_daily_limit` flag.
///
/// ```json
/// { "is_active": false }
/// { "clear_daily_limit": true }
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCredentialRequest {
    #[serde(default)]
    pub is_active: Option<bool>,

    #[serde(default)]
    pub label: Option<String>,

    #[serde(default)]
    pub daily_limit: Option<i64>,

    #[serde(default)]
    pub sort_order: Option<i32>,

    #[serde(default)]
    pub clear_daily_limit: bool,
}

impl UpdateCredentialRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_active.is_none()
            && self.label.is_none()
            && self.daily_limit.is_none()
            && self.sort_order.is_none()
            && !self.clear_daily_limit
        {
            return Err(AppError::Validation(
                "at least one field must be provided".to_string(),
            ));
        }
        if self.clear_daily_limit && self.daily_limit.is_some() {
            return Err(AppError::Validation(
                "daily_limit and clear_daily_limit are mutually exclusive".to_string(),
            ));
        }
        validate_daily_limit(self.daily_limit)
    }
}

fn validate_daily_limit(daily_limit: Option<i64>) -> Result<(), AppError> {
    match daily_limit {
        Some(limit) if limit <= 0 => Err(AppError::Validation(
            "daily_limit must be positive".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Credential as returned by single-record endpoints.
///
/// The secret is masked; callers that need the raw key use the acquisition
/// endpoints, which return `Credential` directly.
#[derive(Debug, Serialize)]
pub struct CredentialResponse {
    pub id: Uuid,
    pub provider: Provider,
    pub masked_key: String,
    pub label: Option<String>,
    pub is_active: bool,
    pub usage_count: i64,
    pub daily_limit: Option<i64>,
    pub sort_order: i32,
    pub last_used_at: Option<DateTime<Utc>>,
    pub last_reset_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Credential> for CredentialResponse {
    fn from(c: Credential) -> Self {
        Self {
            masked_key: mask_api_key(&c.api_key),
            id: c.id,
            provider: c.provider,
            label: c.label,
            is_active: c.is_active,
            usage_count: c.usage_count,
            daily_limit: c.daily_limit,
            sort_order: c.sort_order,
            last_used_at: c.last_used_at,
            last_reset_at: c.last_reset_at,
            created_at: c.created_at,
        }
    }
}

/// One row of the admin list view.
///
/// Carries the raw secret (the admin UI truncates it client-side) next to the
/// masked form, plus the positional display label and whether the selector
/// would hand this key out next.
#[derive(Debug, Serialize)]
pub struct CredentialListItem {
    #[serde(flatten)]
    pub credential: Credential,
    pub masked_key: String,
    pub display_label: String,
    pub remaining: Option<i64>,
    pub is_next: bool,
}

/// Show only the first and last four characters of a secret.
///
/// Short secrets are hidden entirely, since prefix and suffix would overlap.
pub fn mask_api_key(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}

/// Label shown for a credential at 1-based `position` in priority order.
pub fn display_label(label: Option<&str>, position: usize) -> String {
    match label.map(str::trim) {
        Some(l) if !l.is_empty() => l.to_string(),
        _ => format!("Key {position}"),
    }
}
