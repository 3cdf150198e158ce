//! Achievement definitions and requirement shapes

use serde::{Deserialize, Serialize};

use super::conditions::Condition;
use crate::error::ValidationError;

/// Achievement category for grouping
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    General,
    Progress,
    Social,
    Mastery,
    Exploration,
    Special,
    #[serde(other)]
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Progress => "Progress",
            Self::Social => "Social",
            Self::Mastery => "Mastery",
            Self::Exploration => "Exploration",
            Self::Special => "Special",
            Self::Other => "Other",
        }
    }
}

/// Rarity tier; drives the default XP reward and the badge color
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    #[default]
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// XP awarded when a definition does not set its own reward
    pub const fn default_xp(&self) -> u64 {
        match self {
            Self::Common => 10,
            Self::Uncommon => 25,
            Self::Rare => 50,
            Self::Epic => 100,
            Self::Legendary => 250,
        }
    }

    /// Color identifier handed to the theme layer
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Common => "gray",
            Self::Uncommon => "green",
            Self::Rare => "blue",
            Self::Epic => "purple",
            Self::Legendary => "gold",
        }
    }
}

/// Rule deciding when an achievement is earned
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// Earned once the reported metric value reaches `value`
    Threshold { metric: String, value: u64 },
    /// Earned once `count` increments have been accumulated
    Counter { metric: String, count: u64 },
    /// Earned when the tree holds, and the threshold (if any) is reached
    Conditions {
        #[serde(default)]
        metric: Option<String>,
        #[serde(default)]
        threshold: Option<u64>,
        conditions: Condition,
    },
}

impl Requirement {
    pub fn threshold(metric: &str, value: u64) -> Self {
        Self::Threshold {
            metric: metric.to_string(),
            value,
        }
    }

    pub fn counter(metric: &str, count: u64) -> Self {
        Self::Counter {
            metric: metric.to_string(),
            count,
        }
    }

    /// Target progress figure
    pub fn max_progress(&self) -> u64 {
        match self {
            Self::Threshold { value, .. } => *value,
            Self::Counter { count, .. } => *count,
            Self::Conditions { threshold, .. } => threshold.unwrap_or(1),
        }
    }

    /// Metric this requirement listens to (`None` = every action)
    pub fn metric(&self) -> Option<&str> {
        match self {
            Self::Threshold { metric, .. } | Self::Counter { metric, .. } => Some(metric),
            Self::Conditions { metric, .. } => metric.as_deref(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Threshold { metric, value } | Self::Counter { metric, count: value } => {
                if metric.trim().is_empty() {
                    return Err("metric is empty".to_string());
                }
                if *value == 0 {
                    return Err("target must be at least 1".to_string());
                }
                Ok(())
            }
            Self::Conditions {
                metric,
                threshold,
                conditions,
            } => {
                if threshold.is_some() && metric.as_deref().is_none_or(|m| m.trim().is_empty()) {
                    return Err("threshold needs a metric".to_string());
                }
                if *threshold == Some(0) {
                    return Err("threshold must be at least 1".to_string());
                }
                conditions.validate()
            }
        }
    }
}

/// Definition as supplied by callers or a catalog file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub rarity: Rarity,
    pub requirement: Requirement,
    /// Overrides the rarity's default reward
    #[serde(default)]
    pub xp: Option<u64>,
    #[serde(default)]
    pub hidden: bool,
}

impl AchievementDef {
    pub fn new(id: &str, requirement: Requirement) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            icon: String::new(),
            category: Category::default(),
            rarity: Rarity::default(),
            requirement,
            xp: None,
            hidden: false,
        }
    }

    pub fn named(mut self, name: &str, description: &str, icon: &str) -> Self {
        self.name = name.to_string();
        self.description = description.to_string();
        self.icon = icon.to_string();
        self
    }

    pub fn category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    pub fn xp(mut self, xp: u64) -> Self {
        self.xp = Some(xp);
        self
    }
}

/// A registered, immutable achievement
#[derive(Debug, Clone, PartialEq)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub category: Category,
    pub rarity: Rarity,
    pub requirement: Requirement,
    pub max_progress: u64,
    pub xp_reward: u64,
    pub hidden: bool,
}

impl Achievement {
    /// Build from a definition. `strict` also checks the requirement shape.
    pub fn from_def(def: AchievementDef, strict: bool) -> Result<Self, ValidationError> {
        let id = def.id.trim().to_string();
        if id.is_empty() {
            return Err(ValidationError::MissingField("id"));
        }

        if strict {
            def.requirement
                .validate()
                .map_err(|reason| ValidationError::InvalidRequirement {
                    id: id.clone(),
                    reason,
                })?;
        }

        let name = if def.name.trim().is_empty() {
            id.clone()
        } else {
            def.name
        };

        Ok(Self {
            max_progress: def.requirement.max_progress().max(1),
            xp_reward: def.xp.unwrap_or_else(|| def.rarity.default_xp()),
            id,
            name,
            description: def.description,
            icon: def.icon,
            category: def.category,
            rarity: def.rarity,
            requirement: def.requirement,
            hidden: def.hidden,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_threshold_requirement_from_json() {
        let def: AchievementDef = serde_json::from_value(json!({
            "id": "first-login",
            "requirement": {"type": "threshold", "metric": "logins", "value": 1}
        }))
        .unwrap();

        let achievement = Achievement::from_def(def, true).unwrap();
        assert_eq!(achievement.max_progress, 1);
        assert_eq!(achievement.xp_reward, Rarity::Common.default_xp());
        assert_eq!(achievement.name, "first-login");
    }

    #[test]
    fn test_missing_id_rejected() {
        let def = AchievementDef::new("  ", Requirement::counter("logins", 3));
        assert_eq!(
            Achievement::from_def(def, true),
            Err(ValidationError::MissingField("id"))
        );
    }

    #[test]
    fn test_zero_target_rejected_only_when_strict() {
        let def = AchievementDef::new("broken", Requirement::counter("logins", 0));
        assert!(Achievement::from_def(def.clone(), true).is_err());

        let lenient = Achievement::from_def(def, false).unwrap();
        assert_eq!(lenient.max_progress, 1);
    }

    #[test]
    fn test_unknown_category_maps_to_other() {
        let category: Category = serde_json::from_value(json!("seasonal")).unwrap();
        assert_eq!(category, Category::Other);
    }
}
