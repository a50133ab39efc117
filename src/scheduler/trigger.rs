//! Hourly speed-test trigger
//!
//! The trigger remembers the minute-of-hour at which the loop started and
//! fires whenever the wall clock comes back to that minute, at most once per
//! clock hour.

use chrono::{DateTime, Duration, DurationRound, Timelike, Utc};

/// Fires once per hour at a fixed minute
#[derive(Debug, Clone)]
pub struct HourlyTrigger {
    minute: u32,
    last_fired: Option<DateTime<Utc>>,
}

impl HourlyTrigger {
    /// Trigger on the minute of `start`
    ///
    /// The start minute itself counts, so the first iteration runs the test.
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            minute: start.minute(),
            last_fired: None,
        }
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    /// Check whether the trigger fires at `now`, recording the firing
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        if now.minute() != self.minute {
            return false;
        }

        let hour = Self::hour_of(now);
        if self.last_fired == Some(hour) {
            return false;
        }

        self.last_fired = Some(hour);
        true
    }

    /// Time until the trigger minute next comes around
    pub fn until_next(&self, now: DateTime<Utc>) -> Duration {
        let hour = Self::hour_of(now);
        let mut next = hour + Duration::minutes(i64::from(self.minute));
        if next <= now {
            next += Duration::hours(1);
        }
        next - now
    }

    fn hour_of(now: DateTime<Utc>) -> DateTime<Utc> {
        now.duration_trunc(Duration::hours(1)).unwrap_or(now)
    }
}
