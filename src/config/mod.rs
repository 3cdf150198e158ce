//! Configuration loading and management

mod io;
mod settings;

pub use settings::{AchievementSettings, NotificationSettings, ProgressSettings, XpSettings};

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::rewards::MetricIncrement;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationSettings,

    #[serde(default)]
    pub progress: ProgressSettings,

    #[serde(default)]
    pub achievements: AchievementSettings,

    #[serde(default)]
    pub xp: XpSettings,

    /// Action name -> metric increments, merged over the built-in table
    #[serde(default)]
    pub actions: BTreeMap<String, Vec<MetricIncrement>>,
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Position;
    use crate::progress::Easing;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.notifications.max_visible, 5);
        assert!(config.achievements.auto_save);
        assert!((config.xp.multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_config() {
        let config: Config = toml::from_str(
            r#"
[notifications]
max_visible = 2
default_position = "bottom-left"

[progress]
easing = "linear"

[xp]
preset = "relaxed"

[actions]
finish_lesson = [{ metric = "lessons", amount = 1 }, { metric = "quests" }]
"#,
        )
        .unwrap();

        assert_eq!(config.notifications.max_visible, 2);
        assert_eq!(config.notifications.default_position, Position::BottomLeft);
        assert_eq!(config.notifications.default_duration_ms, 5000);
        assert_eq!(config.progress.easing, Easing::Linear);
        assert!((config.xp.multiplier() - 1.5).abs() < f64::EPSILON);
        assert_eq!(config.actions["finish_lesson"].len(), 2);
        assert_eq!(config.actions["finish_lesson"][1].amount, 1);
    }

    #[test]
    fn test_unknown_preset_multiplier_is_neutral() {
        let xp = XpSettings {
            preset: "turbo".into(),
            ..Default::default()
        };
        assert!((xp.multiplier() - 1.0).abs() < f64::EPSILON);
    }
}
