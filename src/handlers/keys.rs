//! Key acquisition endpoints used by the messaging and email senders.
//!
//! - GET /api/v1/providers/{provider}/keys/active - Peek at the next key
//! - POST /api/v1/providers/{provider}/keys/acquire - Take the next key and count the use
//! - POST /api/v1/keys/{id}/usage - Count one use of a key taken with `active`
//!
//! Any authenticated caller may use these; they return the raw secret
//! because the caller is about to authenticate against the provider with it.

use axum::{Json, extract::State, http::StatusCode};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    extract::ApiPath,
    models::{credential::Credential, provider::Provider},
    services::credential_service,
};

/// Return the key the next call should use, without counting it.
///
/// - **Success (200 OK)**: The credential, raw key included
/// - **Error (429)**: Every active key is exhausted
pub async fn active_key(
    State(pool): State<DbPool>,
    ApiPath(provider): ApiPath<Provider>,
) -> Result<Json<Credential>, AppError> {
    credential_service::select_active_key(&pool, provider)
        .await?
        .map(Json)
        .ok_or(AppError::QuotaExhausted(provider))
}

/// Select a key and count the use atomically.
///
/// The returned `usage_count` already includes this call.
pub async fn acquire_key(
    State(pool): State<DbPool>,
    ApiPath(provider): ApiPath<Provider>,
) -> Result<Json<Credential>, AppError> {
    let credential = credential_service::acquire_key(&pool, provider).await?;
    Ok(Json(credential))
}

/// Count one use of a key after a successful provider call.
///
/// Returns 204 No Content, or 404 when the key no longer exists.
pub async fn record_usage(
    State(pool): State<DbPool>,
    ApiPath(key_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    credential_service::record_usage(&pool, key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
