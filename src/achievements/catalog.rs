//! Built-in achievement catalog and catalog file loading
//!
//! Catalog files are a list of [`AchievementDef`] in YAML (`.yaml`/`.yml`)
//! or JSON (anything else).

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use super::conditions::{CompareOp, Condition};
use super::definitions::{AchievementDef, Category, Rarity, Requirement};

/// Definitions shipped with the engine
pub fn default_catalog() -> Vec<AchievementDef> {
    vec![
        // === GENERAL ===
        AchievementDef::new("first-login", Requirement::threshold("logins", 1))
            .named("Welcome Aboard", "Log in for the first time", "👋")
            .category(Category::General),
        AchievementDef::new("regular", Requirement::threshold("logins", 25))
            .named("Regular", "Log in 25 times", "📅")
            .category(Category::General)
            .rarity(Rarity::Uncommon),
        // === PROGRESS ===
        AchievementDef::new("first-quest", Requirement::counter("quests", 1))
            .named("First Steps", "Complete your first quest", "🎯")
            .category(Category::Progress),
        AchievementDef::new("quest-10", Requirement::counter("quests", 10))
            .named("Getting Started", "Complete 10 quests", "📈")
            .category(Category::Progress)
            .rarity(Rarity::Uncommon),
        AchievementDef::new("quest-100", Requirement::counter("quests", 100))
            .named("Century", "Complete 100 quests", "💯")
            .category(Category::Progress)
            .rarity(Rarity::Epic),
        // === SOCIAL ===
        AchievementDef::new("first-share", Requirement::counter("shares", 1))
            .named("Spread the Word", "Share something", "📣")
            .category(Category::Social),
        AchievementDef::new("commentator", Requirement::counter("comments", 20))
            .named("Commentator", "Leave 20 comments", "💬")
            .category(Category::Social)
            .rarity(Rarity::Rare),
        // === EXPLORATION ===
        AchievementDef::new(
            "profile-complete",
            Requirement::Conditions {
                metric: Some("profile_updates".to_string()),
                threshold: None,
                conditions: Condition::And {
                    children: vec![
                        Condition::predicate("has", vec![json!("avatar")]),
                        Condition::predicate("has", vec![json!("bio")]),
                    ],
                },
            },
        )
        .named("Identity", "Fill in both avatar and bio", "🪪")
        .category(Category::Exploration),
        // === MASTERY ===
        AchievementDef::new(
            "perfectionist",
            Requirement::Conditions {
                metric: Some("quests".to_string()),
                threshold: Some(5),
                conditions: Condition::compare("score", CompareOp::Gte, 100.0),
            },
        )
        .named("Perfectionist", "Finish a quest with a perfect score after 5 quests", "✨")
        .category(Category::Mastery)
        .rarity(Rarity::Rare),
        // === SPECIAL ===
        AchievementDef::new(
            "night-owl",
            Requirement::Conditions {
                metric: None,
                threshold: None,
                conditions: Condition::predicate("hour_between", vec![json!(0), json!(5)]),
            },
        )
        .named("Night Owl", "Be active between midnight and 5 AM", "🦉")
        .category(Category::Special)
        .rarity(Rarity::Uncommon),
        AchievementDef::new(
            "weekend-warrior",
            Requirement::Conditions {
                metric: None,
                threshold: None,
                conditions: Condition::predicate("weekend", vec![]),
            },
        )
        .named("Weekend Warrior", "Be active on a weekend", "⚔️")
        .category(Category::Special),
        AchievementDef::new("streak-7", Requirement::threshold("streak_days", 7))
            .named("On Fire", "Keep a 7 day streak", "🔥")
            .category(Category::Special)
            .rarity(Rarity::Rare),
        AchievementDef::new("streak-30", Requirement::threshold("streak_days", 30))
            .named("Unstoppable", "Keep a 30 day streak", "🌋")
            .category(Category::Special)
            .rarity(Rarity::Legendary),
    ]
}

/// Load definitions from a YAML or JSON file
pub fn load_catalog(path: &Path) -> Result<Vec<AchievementDef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog: {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let defs: Vec<AchievementDef> = if is_yaml {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog: {}", path.display()))?
    };

    Ok(defs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::Achievement;
    use tempfile::tempdir;

    #[test]
    fn test_default_catalog_is_valid_and_unique() {
        let defs = default_catalog();
        let mut ids: Vec<&str> = defs.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), defs.len());

        for def in defs {
            assert!(Achievement::from_def(def, true).is_ok());
        }
    }

    #[test]
    fn test_load_yaml_catalog() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(
            &path,
            r#"
- id: bookworm
  name: Bookworm
  category: progress
  rarity: rare
  requirement:
    type: counter
    metric: pages
    count: 50
- id: explorer
  requirement:
    type: conditions
    conditions:
      type: or
      children:
        - type: predicate
          name: has
          args: [map]
        - type: compare
          field: distance
          op: gt
          value: 10
"#,
        )
        .unwrap();

        let defs = load_catalog(&path).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].rarity, Rarity::Rare);
        assert_eq!(defs[0].requirement, Requirement::counter("pages", 50));
    }

    #[test]
    fn test_load_json_catalog_error_has_context() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, "[{").unwrap();

        let err = load_catalog(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse catalog"));
    }
}
