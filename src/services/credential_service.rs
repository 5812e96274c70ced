//! Credential service - key rotation, usage accounting and administration.
//!
//! This service handles:
//! - Choosing the key for the next provider call
//! - Counting each use of a key
//! - Zeroing usage counters on reset
//! - Admin-only create, update, delete, reset and list operations
//!
//! # Atomicity Guarantees
//!
//! Usage is never written back from a value read earlier. `record_usage`
//! increments in a single statement, and `acquire_key` locks the provider's
//! active rows for the duration of select-then-increment, so concurrent
//! callers cannot lose each other's increments.

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        credential::{
            CreateCredentialRequest, Credential, CredentialListItem, QuotaKey,
            UpdateCredentialRequest, display_label, mask_api_key,
        },
        provider::Provider,
    },
    services::selector::{self, UsageSummary},
};
use uuid::Uuid;

/// Read the credential the next call to `provider` should use, without
/// counting a use.
///
/// Returns `None` when every active key is exhausted. Callers that go on to
/// make the provider call should prefer [`acquire_key`], which reserves the
/// use atomically.
pub async fn select_active_key(
    pool: &DbPool,
    provider: Provider,
) -> Result<Option<Credential>, AppError> {
    let candidates = sqlx::query_as::<_, Credential>(
        r#"
        SELECT * FROM credentials
        WHERE provider = $1 AND is_active = true
        ORDER BY sort_order, created_at
        "#,
    )
    .bind(provider)
    .fetch_all(pool)
    .await?;

    Ok(selector::select(&candidates).cloned())
}

/// Count one use of a credential.
///
/// Runs as a single `UPDATE`, so two concurrent calls add exactly two.
///
/// # Errors
///
/// - `CredentialNotFound`: No credential has this id
pub async fn record_usage(pool: &DbPool, key_id: Uuid) -> Result<(), AppError> {
    let updated = sqlx::query(
        r#"
        UPDATE credentials
        SET usage_count = usage_count + 1,
            last_used_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(key_id)
    .execute(pool)
    .await?
    .rows_affected();

    if updated == 0 {
        return Err(AppError::CredentialNotFound);
    }

    tracing::debug!(%key_id, "credential usage recorded");
    Ok(())
}

/// Select a credential for `provider` and count the use in one transaction.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock the provider's active credentials (`FOR UPDATE`)
/// 3. Run the selector over the locked rows
/// 4. Increment the chosen row
/// 5. Commit
///
/// Concurrent acquisitions for the same provider queue on the row locks and
/// each sees the counts left by the previous one.
///
/// # Errors
///
/// - `QuotaExhausted`: No active key is under its daily limit
pub async fn acquire_key(pool: &DbPool, provider: Provider) -> Result<Credential, AppError> {
    let mut tx = pool.begin().await?;

    let candidates = sqlx::query_as::<_, Credential>(
        r#"
        SELECT * FROM credentials
        WHERE provider = $1 AND is_active = true
        ORDER BY sort_order, created_at
        FOR UPDATE
        "#,
    )
    .bind(provider)
    .fetch_all(&mut *tx)
    .await?;

    let Some(chosen) = selector::select(&candidates) else {
        tx.rollback().await?;
        tracing::warn!(%provider, keys = candidates.len(), "no credential under its daily limit");
        return Err(AppError::QuotaExhausted(provider));
    };

    let credential = sqlx::query_as::<_, Credential>(
        r#"
        UPDATE credentials
        SET usage_count = usage_count + 1,
            last_used_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(chosen.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        %provider,
        key_id = %credential.id,
        usage_count = credential.usage_count,
        daily_limit = ?credential.daily_limit,
        "credential acquired"
    );

    Ok(credential)
}

/// Zero one credential's usage counter.
///
/// # Errors
///
/// - `Forbidden`: Caller is not an admin
/// - `CredentialNotFound`: No credential has this id
pub async fn reset_credential(
    pool: &DbPool,
    auth: &AuthContext,
    key_id: Uuid,
) -> Result<Credential, AppError> {
    auth.require_admin()?;

    let credential = sqlx::query_as::<_, Credential>(
        r#"
        UPDATE credentials
        SET usage_count = 0,
            last_reset_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(key_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::CredentialNotFound)?;

    tracing::info!(%key_id, reset_by = %auth.user_id, "credential usage reset");
    Ok(credential)
}

/// Zero the usage counters of every credential of one provider.
///
/// Returns the number of credentials reset.
///
/// # Errors
///
/// - `Forbidden`: Caller is not an admin
pub async fn reset_provider(
    pool: &DbPool,
    auth: &AuthContext,
    provider: Provider,
) -> Result<u64, AppError> {
    auth.require_admin()?;

    let reset = sqlx::query(
        "UPDATE credentials SET usage_count = 0, last_reset_at = NOW() WHERE provider = $1",
    )
    .bind(provider)
    .execute(pool)
    .await?
    .rows_affected();

    tracing::info!(%provider, reset, reset_by = %auth.user_id, "provider usage reset");
    Ok(reset)
}

/// Zero the usage counters of every credential.
///
/// Not guarded: only the daily scheduler calls this, never an HTTP handler.
pub async fn reset_all(pool: &DbPool) -> Result<u64, AppError> {
    let reset = sqlx::query("UPDATE credentials SET usage_count = 0, last_reset_at = NOW()")
        .execute(pool)
        .await?
        .rows_affected();

    Ok(reset)
}

/// Add a credential to a provider.
///
/// # Process
///
/// 1. Verify the caller is an admin
/// 2. Validate the request (non-blank key, positive limit)
/// 3. Fill in the provider's default limit
/// 4. Take the provider's advisory lock and insert with `usage_count = 0`,
///    assigning the next free order when none is given
///
/// # Errors
///
/// - `Forbidden`: Caller is not an admin
/// - `Validation`: Blank key, non-positive limit, or an explicit `sort_order`
///   already taken
pub async fn create_credential(
    pool: &DbPool,
    auth: &AuthContext,
    provider: Provider,
    request: CreateCredentialRequest,
) -> Result<Credential, AppError> {
    auth.require_admin()?;
    let (api_key, label) = request.validate()?;

    let daily_limit = request.daily_limit.or(provider.default_daily_limit());

    let mut tx = pool.begin().await?;

    // Serialize inserts per provider so MAX(sort_order) + 1 is never computed twice.
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::BIGINT)")
        .bind(provider.as_str())
        .execute(&mut *tx)
        .await?;

    let credential = sqlx::query_as::<_, Credential>(
        r#"
        INSERT INTO credentials (provider, api_key, label, daily_limit, sort_order)
        VALUES (
            $1, $2, $3, $4,
            COALESCE(
                $5::INTEGER,
                (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM credentials WHERE provider = $1)
            )
        )
        RETURNING *
        "#,
    )
    .bind(provider)
    .bind(&api_key)
    .bind(label)
    .bind(daily_limit)
    .bind(request.sort_order)
    .fetch_one(&mut *tx)
    .await
    .map_err(|err| match request.sort_order {
        Some(_) => order_conflict(err),
        None => AppError::Database(err),
    })?;

    tx.commit().await?;

    tracing::info!(
        %provider,
        key_id = %credential.id,
        key = %mask_api_key(&api_key),
        sort_order = credential.sort_order,
        created_by = %auth.user_id,
        "credential created"
    );

    Ok(credential)
}

/// Patch a credential's active flag, label, limit or order.
///
/// A blank `label` clears the label so the positional name is shown again.
/// `clear_daily_limit` makes a limited key unlimited.
///
/// # Errors
///
/// - `Forbidden`: Caller is not an admin
/// - `Validation`: Empty patch, non-positive limit, or `sort_order` already taken
/// - `CredentialNotFound`: No credential has this id
pub async fn update_credential(
    pool: &DbPool,
    auth: &AuthContext,
    key_id: Uuid,
    request: UpdateCredentialRequest,
) -> Result<Credential, AppError> {
    auth.require_admin()?;
    request.validate()?;

    let credential = sqlx::query_as::<_, Credential>(
        r#"
        UPDATE credentials
        SET is_active = COALESCE($2, is_active),
            label = CASE WHEN $3::TEXT IS NULL THEN label ELSE NULLIF(btrim($3::TEXT), '') END,
            daily_limit = CASE WHEN $6 THEN NULL ELSE COALESCE($4, daily_limit) END,
            sort_order = COALESCE($5, sort_order)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(key_id)
    .bind(request.is_active)
    .bind(request.label)
    .bind(request.daily_limit)
    .bind(request.sort_order)
    .bind(request.clear_daily_limit)
    .fetch_optional(pool)
    .await
    .map_err(order_conflict)?
    .ok_or(AppError::CredentialNotFound)?;

    tracing::info!(
        %key_id,
        is_active = credential.is_active,
        daily_limit = ?credential.daily_limit,
        updated_by = %auth.user_id,
        "credential updated"
    );

    Ok(credential)
}

/// Permanently delete a credential.
///
/// # Errors
///
/// - `Forbidden`: Caller is not an admin (the record is left untouched)
/// - `CredentialNotFound`: No credential has this id
pub async fn delete_credential(
    pool: &DbPool,
    auth: &AuthContext,
    key_id: Uuid,
) -> Result<(), AppError> {
    auth.require_admin()?;

    let deleted = sqlx::query("DELETE FROM credentials WHERE id = $1")
        .bind(key_id)
        .execute(pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::CredentialNotFound);
    }

    tracing::info!(%key_id, deleted_by = %auth.user_id, "credential deleted");
    Ok(())
}

/// List every credential of a provider in selection order.
pub async fn list_credentials(
    pool: &DbPool,
    auth: &AuthContext,
    provider: Provider,
) -> Result<Vec<CredentialListItem>, AppError> {
    auth.require_admin()?;

    let credentials = load_provider_credentials(pool, provider).await?;
    let next_id = selector::select(&credentials).map(|c| c.id);

    Ok(credentials
        .into_iter()
        .enumerate()
        .map(|(i, credential)| CredentialListItem {
            masked_key: mask_api_key(&credential.api_key),
            display_label: display_label(credential.label.as_deref(), i + 1),
            remaining: credential.remaining(),
            is_next: Some(credential.id) == next_id,
            credential,
        })
        .collect())
}

/// Aggregate today's usage of a provider.
pub async fn usage_summary(
    pool: &DbPool,
    auth: &AuthContext,
    provider: Provider,
) -> Result<UsageSummary, AppError> {
    auth.require_admin()?;

    let credentials = load_provider_credentials(pool, provider).await?;
    Ok(selector::summarize(provider, &credentials))
}

async fn load_provider_credentials(
    pool: &DbPool,
    provider: Provider,
) -> Result<Vec<Credential>, AppError> {
    let credentials = sqlx::query_as::<_, Credential>(
        "SELECT * FROM credentials WHERE provider = $1 ORDER BY sort_order, created_at",
    )
    .bind(provider)
    .fetch_all(pool)
    .await?;

    Ok(credentials)
}

/// Turn a `(provider, sort_order)` unique violation into a validation error.
fn order_conflict(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Validation(
                "sort_order is already used by another key of this provider".to_string(),
            );
        }
    }
    AppError::Database(err)
}
