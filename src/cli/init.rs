//! Init command implementation

use anyhow::{Context, Result, bail};

use super::Paths;

/// Default configuration content for rewardkit init
pub const DEFAULT_CONFIG: &str = r#"# rewardkit configuration
# =======================
#
# Every key is optional; removing a line restores its default.

# ============================================================================
# NOTIFICATIONS - Toasts shown per screen position
# ============================================================================
#
#   max_visible         - Toasts visible at once per position (default: 5)
#   queue_size          - Backlog size reported to callers; a warning is logged beyond it (default: 20)
#   default_position    - top-left, top-center, top-right, bottom-left, bottom-center, bottom-right
#   default_duration_ms - Auto-dismiss after this many ms; 0 keeps toasts until hidden (default: 5000)
#   exit_animation_ms   - Length of the exit animation (default: 300)

[notifications]
max_visible = 5
queue_size = 20
default_position = "top-right"
default_duration_ms = 5000
enable_sound = false
enable_animations = true
exit_animation_ms = 300

# ============================================================================
# PROGRESS - Animated progress indicators
# ============================================================================
#
#   batch_updates - Render animated updates on the next tick only (default: true)
#   easing        - linear, ease-out or ease-in-out (default: ease-out)

[progress]
enable_animations = true
batch_updates = true
animation_duration_ms = 500
easing = "ease-out"

# ============================================================================
# ACHIEVEMENTS
# ============================================================================
#
#   auto_save        - Save after every earn/progress change (default: true)
#   validate_data    - Reject malformed achievement definitions (default: true)
#   track_progress   - Persist and report partial progress (default: true)
#   include_defaults - Register the built-in catalog (default: true)
#   catalog_path     - Extra catalog file, YAML or JSON

[achievements]
auto_save = true
validate_data = true
track_progress = true
include_defaults = true
# catalog_path = "~/.rewardkit/achievements.yaml"

# ============================================================================
# XP - Scaling of raw XP awards
# ============================================================================

[xp]
preset = "standard"
notify_xp = true

[xp.presets]
relaxed = 1.5
standard = 1.0
challenge = 0.75

# ============================================================================
# ACTIONS - Map action names to metric increments
# ============================================================================
#
# Built-in actions: login, complete_quest, share, comment, update_profile, purchase.
# Entries here replace a built-in action of the same name.

[actions]
# finish_lesson = [{ metric = "lessons" }, { metric = "quests", amount = 1 }]
"#;

/// Initialize a new rewardkit configuration
pub async fn init_command(paths: &Paths, force: bool) -> Result<()> {
    let config_path = &paths.config;

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    // Create parent directory (if any)
    if let Some(parent) = config_path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created: {}", config_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewardkit::Config;

    #[test]
    fn test_default_config_parses_to_defaults() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
    }
}
