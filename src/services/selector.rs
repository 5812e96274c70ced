//! Key selection over a snapshot of credentials.
//!
//! Everything here is pure: callers load the candidates (inside a transaction
//! when they intend to use the key) and hand them in as a slice.

use serde::Serialize;
use uuid::Uuid;

use crate::models::credential::{Credential, QuotaKey};
use crate::models::provider::Provider;

/// Pick the credential the next provider call should use.
///
/// Returns the first candidate that is active and under its daily limit
/// (unlimited keys always qualify), ranked by ascending `sort_order` with
/// `created_at` as the tie-break. Input order does not matter.
///
/// `None` means the provider is exhausted for today.
pub fn select<T: QuotaKey>(candidates: &[T]) -> Option<&T> {
    candidates
        .iter()
        .filter(|c| c.is_active() && c.has_capacity())
        .min_by_key(|c| (c.sort_order(), c.created_at()))
}

/// Aggregate quota state of one provider, as shown on the usage dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub provider: Provider,
    pub total_keys: usize,
    pub active_keys: usize,
    /// Active keys that have hit their daily limit.
    pub exhausted_keys: usize,
    /// Sum of today's usage over all keys.
    pub total_usage: i64,
    /// Calls left today across active keys; `None` if any active key is unlimited.
    pub remaining_capacity: Option<i64>,
    /// Key the selector would return right now.
    pub next_key_id: Option<Uuid>,
}

/// Build the usage summary for `provider` from its credentials.
pub fn summarize(provider: Provider, credentials: &[Credential]) -> UsageSummary {
    let active: Vec<&Credential> = credentials.iter().filter(|c| c.is_active).collect();

    let remaining_capacity = active
        .iter()
        .map(|c| c.remaining())
        .try_fold(0i64, |acc, r| r.map(|r| acc + r));

    UsageSummary {
        provider,
        total_keys: credentials.len(),
        active_keys: active.len(),
        exhausted_keys: active.iter().filter(|c| !c.has_capacity()).count(),
        total_usage: credentials.iter().map(|c| c.usage_count).sum(),
        remaining_capacity,
        next_key_id: select(credentials).map(|c| c.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn cred(order: i32, usage: i64, limit: Option<i64>, active: bool) -> Credential {
        Credential {
            id: Uuid::new_v4(),
            provider: Provider::Brevo,
            api_key: format!("xkeysib-key-{order}"),
            label: None,
            is_active: active,
            usage_count: usage,
            daily_limit: limit,
            sort_order: order,
            last_used_at: None,
            last_reset_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn skips_exhausted_key_and_takes_next_order() {
        let keys = vec![
            cred(0, 300, Some(300), true),
            cred(1, 50, Some(300), true),
            cred(2, 0, Some(300), true),
        ];
        let chosen = select(&keys).unwrap();
        assert_eq!(chosen.sort_order, 1);
    }

    #[test]
    fn never_returns_inactive_key() {
        let keys = vec![
            cred(0, 0, Some(300), false),
            cred(1, 0, None, false),
            cred(2, 10, Some(300), true),
        ];
        assert_eq!(select(&keys).unwrap().sort_order, 2);

        let all_inactive = vec![cred(0, 0, None, false), cred(1, 0, Some(5), false)];
        assert!(select(&all_inactive).is_none());
    }

    #[test]
    fn none_when_every_active_key_is_at_limit() {
        let keys = vec![
            cred(0, 300, Some(300), true),
            cred(1, 301, Some(300), true),
            cred(2, 0, Some(300), false),
        ];
        assert!(select(&keys).is_none());
        assert!(select::<Credential>(&[]).is_none());
    }

    #[test]
    fn smallest_order_wins_regardless_of_input_order() {
        let keys = vec![
            cred(7, 0, Some(10), true),
            cred(3, 9, Some(10), true),
            cred(5, 0, None, true),
        ];
        assert_eq!(select(&keys).unwrap().sort_order, 3);
    }

    #[test]
    fn unlimited_key_is_always_eligible_when_active() {
        let mut key = cred(0, 1_000_000, None, true);
        key.provider = Provider::Gemini;
        let keys = vec![key];
        assert!(select(&keys).is_some());
    }

    #[test]
    fn equal_order_falls_back_to_creation_time() {
        let mut older = cred(1, 0, Some(300), true);
        let mut newer = cred(1, 0, Some(300), true);
        older.created_at = Utc::now() - Duration::hours(2);
        newer.created_at = Utc::now();
        let older_id = older.id;
        let keys = vec![newer, older];
        assert_eq!(select(&keys).unwrap().id, older_id);
    }

    #[test]
    fn summary_counts_usage_and_capacity() {
        let keys = vec![
            cred(0, 300, Some(300), true),
            cred(1, 50, Some(300), true),
            cred(2, 7, Some(300), false),
        ];
        let summary = summarize(Provider::Brevo, &keys);
        assert_eq!(summary.total_keys, 3);
        assert_eq!(summary.active_keys, 2);
        assert_eq!(summary.exhausted_keys, 1);
        assert_eq!(summary.total_usage, 357);
        assert_eq!(summary.remaining_capacity, Some(250));
        assert_eq!(summary.next_key_id, Some(keys[1].id));
    }

    #[test]
    fn summary_capacity_is_unbounded_with_unlimited_key() {
        let keys = vec![cred(0, 3, Some(10), true), cred(1, 40, None, true)];
        let summary = summarize(Provider::Gemini, &keys);
        assert_eq!(summary.remaining_capacity, None);
        assert_eq!(summary.exhausted_keys, 0);
    }
}
