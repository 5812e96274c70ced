//! Daily quota reset task.
//!
//! Provider quotas roll over once a day. When enabled, this task zeroes every
//! credential's usage counter at the configured UTC hour. On startup, and
//! after a failed attempt, it first checks whether the most recent reset
//! boundary was missed (the process was down, or the database was
//! unreachable) and catches up before sleeping. Deployments that prefer an
//! external cron job leave it disabled and call
//! `POST /api/v1/providers/{provider}/reset` instead.

use std::time::Duration;

use chrono::{DateTime, Days, NaiveTime, Utc};
use tokio::task::JoinHandle;

use crate::{db::DbPool, error::AppError, services::credential_service};

const RETRY_INITIAL: Duration = Duration::from_secs(5);
const RETRY_MAX: Duration = Duration::from_secs(300);

/// First instant at `hour:00:00` UTC strictly after `now`.
///
/// `hour` must be in `0..=23`; the configuration layer rejects anything else.
pub fn next_reset_after(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default();
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Days::new(1)
    }
}

/// Most recent instant at `hour:00:00` UTC at or before `now`.
pub fn last_reset_boundary(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    next_reset_after(now, hour) - Days::new(1)
}

/// Whether the counters still hold usage from before the last boundary.
///
/// `oldest` is the earliest "counting since" instant over all credentials:
/// the last reset, or the creation time of a key never reset. `None` means
/// there are no credentials and nothing to reset.
pub fn reset_due(oldest: Option<DateTime<Utc>>, now: DateTime<Utc>, hour: u32) -> bool {
    oldest.is_some_and(|oldest| oldest < last_reset_boundary(now, hour))
}

/// Reset every counter if the last boundary has passed without a reset.
///
/// Returns the number of credentials reset, or `None` when nothing was due.
pub async fn run_due_reset(
    pool: &DbPool,
    hour: u32,
    now: DateTime<Utc>,
) -> Result<Option<u64>, AppError> {
    let oldest: Option<DateTime<Utc>> =
        sqlx::query_scalar("SELECT MIN(COALESCE(last_reset_at, created_at)) FROM credentials")
            .fetch_one(pool)
            .await?;

    if !reset_due(oldest, now, hour) {
        return Ok(None);
    }

    let reset = credential_service::reset_all(pool).await?;
    Ok(Some(reset))
}

/// Start the reset loop on the tokio runtime.
pub fn spawn(pool: DbPool, hour: u32) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut retry = RETRY_INITIAL;
        loop {
            match run_due_reset(&pool, hour, Utc::now()).await {
                Ok(Some(reset)) => tracing::info!(reset, "daily quota reset complete"),
                Ok(None) => tracing::debug!("quota counters are current"),
                Err(err) => {
                    tracing::error!(
                        error = %err,
                        retry_in_secs = retry.as_secs(),
                        "daily quota reset failed"
                    );
                    tokio::time::sleep(retry).await;
                    retry = (retry * 2).min(RETRY_MAX);
                    continue;
                }
            }
            retry = RETRY_INITIAL;

            let now = Utc::now();
            let next = next_reset_after(now, hour);
            tracing::info!(next_reset = %next, "quota reset scheduled");

            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn later_today_when_hour_not_reached() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 1, 30, 0).unwrap();
        let next = next_reset_after(now, 4);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap());
    }

    #[test]
    fn tomorrow_when_hour_passed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 5, 0, 0).unwrap();
        let next = next_reset_after(now, 4);
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 3, 11, 4, 0, 0).unwrap());
    }

    #[test]
    fn exactly_on_the_hour_schedules_next_day() {
        let now = Utc.with_ymd_and_hms(2025, 12, 31, 0, 0, 0).unwrap();
        let next = next_reset_after(now, 0);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn boundary_is_today_once_the_hour_has_passed() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 5, 0, 0).unwrap();
        assert_eq!(
            last_reset_boundary(now, 4),
            Utc.with_ymd_and_hms(2025, 3, 10, 4, 0, 0).unwrap()
        );

        let early = Utc.with_ymd_and_hms(2025, 3, 10, 1, 0, 0).unwrap();
        assert_eq!(
            last_reset_boundary(early, 4),
            Utc.with_ymd_and_hms(2025, 3, 9, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn missed_boundary_is_due() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let yesterday = Utc.with_ymd_and_hms(2025, 3, 9, 0, 5, 0).unwrap();
        assert!(reset_due(Some(yesterday), now, 0));
    }

    #[test]
    fn reset_after_boundary_is_not_due() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let this_morning = Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 1).unwrap();
        assert!(!reset_due(Some(this_morning), now, 0));
        assert!(!reset_due(Some(last_reset_boundary(now, 0)), now, 0));
    }

    #[test]
    fn nothing_is_due_without_credentials() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        assert!(!reset_due(None, now, 0));
    }
}
