//! Outbound providers whose API keys are rotated by this service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// External service a credential authenticates against.
///
/// Stored in the `credentials.provider` column as the Postgres enum
/// `credential_provider`, and written lowercase in JSON and URL paths
/// (e.g. `/api/v1/providers/brevo/keys`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "credential_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Brevo transactional email. Free-tier keys may send 300 emails a day.
    Brevo,
    /// Gemini AI. No hard per-key cap is tracked.
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Brevo => "brevo",
            Provider::Gemini => "gemini",
        }
    }

    /// Daily limit applied to a new credential when the admin does not give one.
    ///
    /// `None` means the key is unlimited and is selected whenever it is active.
    pub fn default_daily_limit(&self) -> Option<i64> {
        match self {
            Provider::Brevo => Some(300),
            Provider::Gemini => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Provider::Brevo).unwrap(), "\"brevo\"");
        let parsed: Provider = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(parsed, Provider::Gemini);
        assert!(serde_json::from_str::<Provider>("\"whatsapp\"").is_err());
    }

    #[test]
    fn only_brevo_has_a_default_cap() {
        assert_eq!(Provider::Brevo.default_daily_limit(), Some(300));
        assert_eq!(Provider::Gemini.default_daily_limit(), None);
    }
}
