//! Recency decay for ticket and solution timestamps
//!
//! score = exp(-age_days / half_life_days), absent timestamp = 0.0.
//! Future timestamps (clock skew) clamp to age 0.

use chrono::{DateTime, Utc};

/// Reference half-life in days
pub const DEFAULT_HALF_LIFE_DAYS: f64 = 180.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Source of "now" for everything time-dependent
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant (tests, replays)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Exponential recency decay
#[derive(Debug, Clone, Copy)]
pub struct RecencyModel {
    pub half_life_days: f64,
}

impl Default for RecencyModel {
    fn default() -> Self {
        Self {
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }
}

impl RecencyModel {
    pub fn new(half_life_days: f64) -> Self {
        Self { half_life_days }
    }

    /// Score a timestamp relative to `now`, in [0, 1]
    pub fn score(&self, timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
        let Some(ts) = timestamp else {
            return 0.0;
        };

        let age_secs = (now - ts).num_seconds().max(0) as f64;
        let age_days = age_secs / SECONDS_PER_DAY;

        (-age_days / self.half_life_days).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_absent_timestamp_is_stale() {
        assert_eq!(RecencyModel::default().score(None, now()), 0.0);
    }

    #[test]
    fn test_now_scores_one() {
        assert_relative_eq!(RecencyModel::default().score(Some(now()), now()), 1.0);
    }

    #[test]
    fn test_half_life_age_scores_inverse_e() {
        let ts = now() - Duration::days(180);
        let score = RecencyModel::default().score(Some(ts), now());
        assert_relative_eq!(score, (-1.0f64).exp(), epsilon = 1e-9);
        assert_relative_eq!(score, 0.368, epsilon = 1e-3);
    }

    #[test]
    fn test_strictly_decreasing_in_age() {
        let model = RecencyModel::default();
        let mut previous = model.score(Some(now()), now());
        for days in [1, 7, 30, 90, 365, 3650] {
            let score = model.score(Some(now() - Duration::days(days)), now());
            assert!(score < previous, "age {} days should score lower", days);
            assert!(score > 0.0);
            previous = score;
        }
    }

    #[test]
    fn test_future_timestamp_clamps_to_one() {
        let ts = now() + Duration::days(3);
        assert_relative_eq!(RecencyModel::default().score(Some(ts), now()), 1.0);
    }

    #[test]
    fn test_partial_days_count() {
        // 12 hours old is fresher than 1 day old, staler than now
        let model = RecencyModel::default();
        let half_day = model.score(Some(now() - Duration::hours(12)), now());
        let one_day = model.score(Some(now() - Duration::days(1)), now());
        assert!(half_day < 1.0);
        assert!(half_day > one_day);
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock(now());
        assert_eq!(clock.now(), now());
    }
}
