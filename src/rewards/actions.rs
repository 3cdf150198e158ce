//! Action name -> metric increments

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One metric bumped by an action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricIncrement {
    pub metric: String,
    #[serde(default = "one")]
    pub amount: u64,
}

fn one() -> u64 {
    1
}

impl MetricIncrement {
    pub fn new(metric: &str, amount: u64) -> Self {
        Self {
            metric: metric.to_string(),
            amount,
        }
    }
}

const BUILTIN_ACTIONS: &[(&str, &str)] = &[
    ("login", "logins"),
    ("complete_quest", "quests"),
    ("share", "shares"),
    ("comment", "comments"),
    ("update_profile", "profile_updates"),
    ("purchase", "purchases"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct ActionTable {
    actions: BTreeMap<String, Vec<MetricIncrement>>,
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ActionTable {
    pub fn empty() -> Self {
        Self {
            actions: BTreeMap::new(),
        }
    }

    pub fn builtin() -> Self {
        let actions = BUILTIN_ACTIONS
            .iter()
            .map(|(action, metric)| (action.to_string(), vec![MetricIncrement::new(metric, 1)]))
            .collect();
        Self { actions }
    }

    /// Built-ins with configured entries replacing same-named actions
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<MetricIncrement>>) -> Self {
        let mut table = Self::builtin();
        for (action, increments) in overrides {
            table.insert(action, increments.clone());
        }
        table
    }

    pub fn insert(&mut self, action: &str, increments: Vec<MetricIncrement>) {
        self.actions.insert(action.to_string(), increments);
    }

    /// Increments for `action`; empty for unknown actions
    pub fn lookup(&self, action: &str) -> &[MetricIncrement] {
        self.actions.get(action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }
}
