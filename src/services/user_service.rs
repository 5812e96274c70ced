//! User bootstrap.
//!
//! Sessions and passwords live in the main application. This service only
//! needs one admin able to manage keys on a fresh database, so startup can
//! seed that admin from configuration.

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{ADMIN_ROLE, User, hash_token},
};

/// Create or update the admin user `email` so that `token` authenticates it.
///
/// Re-running with the same email rotates the token and restores the admin
/// role.
pub async fn ensure_admin(pool: &DbPool, email: &str, token: &str) -> Result<User, AppError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Validation(
            "admin bootstrap token must not be empty".to_string(),
        ));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, name, role, token_hash)
        VALUES ($1, 'Administrator', $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET role = EXCLUDED.role,
            token_hash = EXCLUDED.token_hash
        RETURNING id, email, name, role, token_hash, created_at
        "#,
    )
    .bind(email)
    .bind(ADMIN_ROLE)
    .bind(hash_token(token))
    .fetch_one(pool)
    .await?;

    Ok(user)
}
