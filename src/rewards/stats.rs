//! Aggregate per-user counters

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Counters owned by the reward system and persisted with the save data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatistics {
    #[serde(rename = "totalXP", default)]
    pub total_xp: u64,
    #[serde(default = "first_level")]
    pub level: u32,
    #[serde(default)]
    pub achievements_earned: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    /// Milliseconds since the epoch
    #[serde(default)]
    pub joined_at: Option<i64>,
    #[serde(default)]
    pub last_active_day: Option<NaiveDate>,
    /// Running totals per metric name
    #[serde(default)]
    pub metrics: BTreeMap<String, u64>,
}

fn first_level() -> u32 {
    1
}

impl Default for UserStatistics {
    fn default() -> Self {
        Self {
            total_xp: 0,
            level: first_level(),
            achievements_earned: 0,
            current_streak: 0,
            max_streak: 0,
            joined_at: None,
            last_active_day: None,
            metrics: BTreeMap::new(),
        }
    }
}

impl UserStatistics {
    pub fn metric(&self, name: &str) -> u64 {
        self.metrics.get(name).copied().unwrap_or(0)
    }

    /// Add `amount` to a metric and return the new total
    pub fn bump_metric(&mut self, name: &str, amount: u64) -> u64 {
        let total = self.metrics.entry(name.to_string()).or_default();
        *total = total.saturating_add(amount);
        *total
    }
}
