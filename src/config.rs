//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `QUOTA_RESET_ENABLED` (optional): run the in-process daily reset, defaults to true
/// - `QUOTA_RESET_HOUR_UTC` (optional): hour of the daily reset, 0-23, defaults to 0
/// - `ADMIN_BOOTSTRAP_TOKEN` (optional): seed an admin user with this bearer token
/// - `ADMIN_BOOTSTRAP_EMAIL` (optional): email of that admin, defaults to admin@localhost
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_reset_enabled")]
    pub quota_reset_enabled: bool,

    #[serde(default)]
    pub quota_reset_hour_utc: u32,

    #[serde(default)]
    pub admin_bootstrap_token: Option<String>,

    #[serde(default = "default_admin_email")]
    pub admin_bootstrap_email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("QUOTA_RESET_HOUR_UTC must be between 0 and 23, got {0}")]
    InvalidResetHour(u32),
}

fn default_port() -> u16 {
    3000
}

fn default_reset_enabled() -> bool {
    true
}

fn default_admin_email() -> String {
    "admin@localhost".to_string()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - The reset hour is outside 0-23
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        envy::from_env::<Config>()?.validated()
    }

    /// Build a configuration from explicit key/value pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(vars)?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.quota_reset_hour_utc > 23 {
            return Err(ConfigError::InvalidResetHour(self.quota_reset_hour_utc));
        }
        Ok(self)
    }
}
