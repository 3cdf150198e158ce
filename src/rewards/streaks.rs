//! Daily streak tracking
//!
//! A streak counts consecutive calendar days with at least one tracked
//! action.

use chrono::{Local, NaiveDate};

use super::stats::UserStatistics;

/// Metric name mirroring the current streak
pub const STREAK_METRIC: &str = "streak_days";

/// Outcome of recording activity for a day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// Already counted today (or the day lies in the past)
    Unchanged,
    /// Yesterday was active; streak grew to the given length
    Extended(u32),
    /// First activity or a gap; streak restarted at 1
    Restarted,
}

impl StreakChange {
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Get today's local date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl UserStatistics {
    /// Count `day` as active and update the streak counters
    pub fn record_activity(&mut self, day: NaiveDate) -> StreakChange {
        let change = match self.last_active_day {
            Some(last) if day <= last => return StreakChange::Unchanged,
            Some(last) if (day - last).num_days() == 1 && self.current_streak > 0 => {
                self.current_streak += 1;
                StreakChange::Extended(self.current_streak)
            }
            _ => {
                self.current_streak = 1;
                StreakChange::Restarted
            }
        };

        self.last_active_day = Some(day);
        self.max_streak = self.max_streak.max(self.current_streak);
        self.metrics
            .insert(STREAK_METRIC.to_string(), u64::from(self.current_streak));
        change
    }

    /// Active if the last activity was today or yesterday
    pub fn is_streak_active(&self, today: NaiveDate) -> bool {
        self.last_active_day
            .is_some_and(|last| (today - last).num_days() <= 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_consecutive_days_extend() {
        let mut stats = UserStatistics::default();
        assert_eq!(stats.record_activity(day(1)), StreakChange::Restarted);
        assert_eq!(stats.record_activity(day(1)), StreakChange::Unchanged);
        assert_eq!(stats.record_activity(day(2)), StreakChange::Extended(2));
        assert_eq!(stats.record_activity(day(3)), StreakChange::Extended(3));
        assert_eq!(stats.current_streak, 3);
        assert_eq!(stats.metric(STREAK_METRIC), 3);
    }

    #[test]
    fn test_gap_restarts_but_keeps_best() {
        let mut stats = UserStatistics::default();
        stats.record_activity(day(1));
        stats.record_activity(day(2));
        assert_eq!(stats.record_activity(day(5)), StreakChange::Restarted);
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.max_streak, 2);
        assert!(stats.is_streak_active(day(6)));
        assert!(!stats.is_streak_active(day(7)));
    }

    #[test]
    fn test_past_day_ignored() {
        let mut stats = UserStatistics::default();
        stats.record_activity(day(10));
        assert_eq!(stats.record_activity(day(9)), StreakChange::Unchanged);
        assert_eq!(stats.last_active_day, Some(day(10)));
    }
}
