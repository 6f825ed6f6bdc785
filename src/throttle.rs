//! Cooldown policy for re-fetch decisions. Pure; the store supplies the
//! history timestamp and the caller supplies the source-specific cooldown.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// True when a (query, source) pair is due for another fetch: never attempted,
/// or the cooldown has fully elapsed since the last completed attempt.
pub fn due(
    last_collected_at: Option<DateTime<Utc>>,
    cooldown: Duration,
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last_collected_at else {
        return true;
    };
    let cooldown = TimeDelta::from_std(cooldown).unwrap_or(TimeDelta::MAX);
    now.signed_duration_since(last) > cooldown
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(n: i64) -> TimeDelta {
        TimeDelta::hours(n)
    }

    #[test]
    fn never_attempted_is_always_due() {
        assert!(due(None, Duration::from_secs(86_400), Utc::now()));
        assert!(due(None, Duration::ZERO, Utc::now()));
    }

    #[test]
    fn due_only_after_the_window_elapses() {
        let now = Utc::now();
        let cooldown = Duration::from_secs(6 * 3600);

        assert!(!due(Some(now - hours(1)), cooldown, now));
        assert!(!due(Some(now - hours(6)), cooldown, now));
        assert!(due(Some(now - hours(7)), cooldown, now));
    }

    #[test]
    fn zero_cooldown_means_any_elapsed_time_is_due() {
        let now = Utc::now();
        assert!(due(Some(now - TimeDelta::seconds(1)), Duration::ZERO, now));
        assert!(!due(Some(now), Duration::ZERO, now));
    }

    #[test]
    fn oversized_cooldowns_saturate_instead_of_wrapping() {
        let now = Utc::now();
        assert!(!due(
            Some(now - hours(1)),
            Duration::from_secs(u64::MAX),
            now
        ));
    }
}
