//! Credential administration HTTP handlers.
//!
//! This module implements the admin-only endpoints:
//! - POST /api/v1/providers/{provider}/keys - Add a key
//! - GET /api/v1/providers/{provider}/keys - List keys in rotation order
//! - GET /api/v1/providers/{provider}/usage - Usage summary
//! - POST /api/v1/providers/{provider}/reset - Reset all counters of a provider
//! - PATCH /api/v1/keys/{id} - Toggle or edit a key
//! - DELETE /api/v1/keys/{id} - Delete a key
//! - POST /api/v1/keys/{id}/reset - Reset one key's counter
//!
//! Admin checks happen in the service layer so every entry point shares them.

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    extract::{ApiJson, ApiPath},
    middleware::auth::AuthContext,
    models::{
        credential::{
            CreateCredentialRequest, CredentialListItem, CredentialResponse,
            UpdateCredentialRequest,
        },
        provider::Provider,
    },
    services::{credential_service, selector::UsageSummary},
};

/// Add a credential to a provider.
///
/// # Request Body
///
/// ```json
/// {
///   "api_key": "xkeysib-0123456789abcdef",
///   "label": "Marketing",
///   "daily_limit": 300
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The stored credential, secret masked
/// - **Error (400)**: Blank `api_key`, bad limit, or order already in use
/// - **Error (403)**: Caller is not an admin
pub async fn create_credential(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(provider): ApiPath<Provider>,
    ApiJson(request): ApiJson<CreateCredentialRequest>,
) -> Result<impl IntoResponse, AppError> {
    let credential =
        credential_service::create_credential(&pool, &auth, provider, request).await?;

    Ok((StatusCode::CREATED, Json(CredentialResponse::from(credential))))
}

/// List a provider's credentials in the order the selector tries them.
///
/// Each item carries the raw key (truncated client-side), the masked key,
/// the display label ("Key N" when unnamed) and `is_next`.
pub async fn list_credentials(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(provider): ApiPath<Provider>,
) -> Result<Json<Vec<CredentialListItem>>, AppError> {
    let items = credential_service::list_credentials(&pool, &auth, provider).await?;
    Ok(Json(items))
}

/// Usage dashboard numbers for a provider.
///
/// ```json
/// {
///   "provider": "brevo",
///   "total_keys": 3,
///   "active_keys": 2,
///   "exhausted_keys": 1,
///   "total_usage": 350,
///   "remaining_capacity": 250,
///   "next_key_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
pub async fn usage_summary(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(provider): ApiPath<Provider>,
) -> Result<Json<UsageSummary>, AppError> {
    let summary = credential_service::usage_summary(&pool, &auth, provider).await?;
    Ok(Json(summary))
}

#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub provider: Provider,
    pub reset: u64,
}

/// Zero the counters of every key of a provider.
///
/// Meant for external schedulers that own the daily rollover.
pub async fn reset_provider(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(provider): ApiPath<Provider>,
) -> Result<Json<ResetResponse>, AppError> {
    let reset = credential_service::reset_provider(&pool, &auth, provider).await?;
    Ok(Json(ResetResponse { provider, reset }))
}

/// Patch a credential.
///
/// ```json
/// { "is_active": false }
/// ```
///
/// Send `"clear_daily_limit": true` to make a key unlimited.
///
/// - **Success (200 OK)**: The updated credential, secret masked
/// - **Error (404)**: No such credential
pub async fn update_credential(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(key_id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateCredentialRequest>,
) -> Result<Json<CredentialResponse>, AppError> {
    let credential = credential_service::update_credential(&pool, &auth, key_id, request).await?;
    Ok(Json(credential.into()))
}

/// Permanently delete a credential.
///
/// Returns 204 No Content on success.
pub async fn delete_credential(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(key_id): ApiPath<Uuid>,
) -> Result<StatusCode, AppError> {
    credential_service::delete_credential(&pool, &auth, key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Zero one credential's counter.
pub async fn reset_credential(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(key_id): ApiPath<Uuid>,
) -> Result<Json<CredentialResponse>, AppError> {
    let credential = credential_service::reset_credential(&pool, &auth, key_id).await?;
    Ok(Json(credential.into()))
}
