//! Bearer token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the token from the Authorization header
//! 2. Hash it and load the matching user record
//! 3. Inject the caller's identity and role into the request
//! 4. Reject unauthenticated requests with HTTP 401
//!
//! Role checks happen later, inside the operations that need them, through
//! [`AuthContext::require_admin`].

use crate::{
    db::DbPool,
    error::AppError,
    models::user::{ADMIN_ROLE, User, hash_token},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it with
/// `Extension<AuthContext>` and pass it down to the service layer.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,

    pub email: String,

    /// Role copied from the user record at authentication time.
    pub role: String,
}

impl AuthContext {
    /// Fail with [`AppError::Forbidden`] unless the caller is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == ADMIN_ROLE {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, role = %self.role, "admin operation refused");
            Err(AppError::Forbidden)
        }
    }
}

impl From<User> for AuthContext {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer token authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query the `users` table for a matching hash
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    let token_hash = hash_token(token);

    let user = sqlx::query_as::<_, User>(
        "SELECT id, email, name, role, token_hash, created_at
         FROM users
         WHERE token_hash = $1",
    )
    .bind(&token_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::Unauthorized)?;

    tracing::debug!(user_id = %user.id, role = %user.role, "request authenticated");

    request.extensions_mut().insert(AuthContext::from(user));

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: &str) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            email: "agent@example.com".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn only_admin_role_passes() {
        assert!(ctx("admin").require_admin().is_ok());
        assert!(matches!(ctx("agent").require_admin(), Err(AppError::Forbidden)));
        assert!(matches!(ctx("Admin").require_admin(), Err(AppError::Forbidden)));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(bearer_token("Bearer    "), None);
        assert_eq!(bearer_token("Basic abc123"), None);
    }
}
