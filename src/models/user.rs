//! User model for authentication and authorization.
//!
//! Users authenticate with a bearer token that is stored only as a SHA-256
//! hash. The `role` column decides whether a user may administer credentials.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Role value that grants access to the credential administration endpoints.
pub const ADMIN_ROLE: &str = "admin";

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `email`: Login address, unique
/// - `name`: Optional display name
/// - `role`: `"admin"` or any other role string
/// - `token_hash`: SHA-256 hash of the user's bearer token
/// - `created_at`: When the user was created
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    pub email: String,

    pub name: Option<String>,

    /// Only `"admin"` is meaningful to this service; every other value is a
    /// regular caller that may acquire keys but not manage them.
    pub role: String,

    /// SHA-256 hash of the bearer token (64 hex characters)
    ///
    /// When a request comes in with "Bearer abc123", we:
    /// 1. Hash "abc123" with SHA-256
    /// 2. Look up this hash in the database
    /// 3. If found, authenticate the request as this user
    pub token_hash: String,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

/// Hex-encoded SHA-256 of a bearer token, as stored in `users.token_hash`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_hex_sha256() {
        let hash = hash_token("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash.len(), 64);
    }
}
