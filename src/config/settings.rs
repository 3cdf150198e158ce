//! Per-subsystem settings

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::notifications::Position;
use crate::progress::Easing;

/// Toast queue settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Ceiling of simultaneously visible toasts per position
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,

    /// Advertised backlog size per position. The queue itself is unbounded;
    /// exceeding this only logs a warning.
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,

    #[serde(default)]
    pub default_position: Position,

    /// Auto-dismiss delay, 0 = persistent
    #[serde(default = "default_duration_ms")]
    pub default_duration_ms: u64,

    #[serde(default)]
    pub enable_sound: bool,

    #[serde(default = "default_true")]
    pub enable_animations: bool,

    /// Length of the exit animation between `exiting` and `removed`
    #[serde(default = "default_exit_animation_ms")]
    pub exit_animation_ms: u64,
}

fn default_max_visible() -> usize {
    5
}

fn default_queue_size() -> usize {
    20
}

fn default_duration_ms() -> u64 {
    5000
}

fn default_exit_animation_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            max_visible: default_max_visible(),
            queue_size: default_queue_size(),
            default_position: Position::default(),
            default_duration_ms: default_duration_ms(),
            enable_sound: false,
            enable_animations: true,
            exit_animation_ms: default_exit_animation_ms(),
        }
    }
}

/// Progress indicator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSettings {
    #[serde(default = "default_true")]
    pub enable_animations: bool,

    /// Render only on scheduler ticks. When off, every update also renders
    /// synchronously.
    #[serde(default = "default_true")]
    pub batch_updates: bool,

    #[serde(default = "default_animation_duration_ms")]
    pub animation_duration_ms: u64,

    #[serde(default)]
    pub easing: Easing,
}

fn default_animation_duration_ms() -> u64 {
    500
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            enable_animations: true,
            batch_updates: true,
            animation_duration_ms: default_animation_duration_ms(),
            easing: Easing::default(),
        }
    }
}

/// Achievement controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementSettings {
    /// Save after every earn/progress mutation
    #[serde(default = "default_true")]
    pub auto_save: bool,

    /// Reject malformed requirements at registration
    #[serde(default = "default_true")]
    pub validate_data: bool,

    /// Persist and emit non-earning progress changes
    #[serde(default = "default_true")]
    pub track_progress: bool,

    /// Extra catalog file (YAML or JSON)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    /// Register the built-in catalog
    #[serde(default = "default_true")]
    pub include_defaults: bool,
}

impl Default for AchievementSettings {
    fn default() -> Self {
        Self {
            auto_save: true,
            validate_data: true,
            track_progress: true,
            catalog_path: None,
            include_defaults: true,
        }
    }
}

/// XP scaling settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpSettings {
    /// Active preset name
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Preset name -> multiplier applied to raw XP awards
    #[serde(default = "default_presets")]
    pub presets: BTreeMap<String, f64>,

    /// Show a toast for every XP award
    #[serde(default = "default_true")]
    pub notify_xp: bool,
}

fn default_preset() -> String {
    "standard".to_string()
}

fn default_presets() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("relaxed".to_string(), 1.5),
        ("standard".to_string(), 1.0),
        ("challenge".to_string(), 0.75),
    ])
}

impl Default for XpSettings {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            presets: default_presets(),
            notify_xp: true,
        }
    }
}

impl XpSettings {
    /// Multiplier of the active preset (1.0 when the preset is unknown)
    pub fn multiplier(&self) -> f64 {
        self.presets
            .get(&self.preset)
            .copied()
            .filter(|m| m.is_finite() && *m >= 0.0)
            .unwrap_or(1.0)
    }
}
