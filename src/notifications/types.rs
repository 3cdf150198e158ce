//! Notification payloads, positions and lifecycle states

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationType {
    Info,
    Success,
    Warning,
    Error,
    Xp,
    Achievement,
    LevelUp,
    Badge,
    Custom,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Xp => "xp",
            Self::Achievement => "achievement",
            Self::LevelUp => "level-up",
            Self::Badge => "badge",
            Self::Custom => "custom",
        }
    }

    pub fn default_icon(&self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Success => "✅",
            Self::Warning => "⚠️",
            Self::Error => "❌",
            Self::Xp => "⭐",
            Self::Achievement => "🏆",
            Self::LevelUp => "🎉",
            Self::Badge => "🎖️",
            Self::Custom => "",
        }
    }
}

/// Screen region with its own queue and visible ceiling
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    TopLeft,
    TopCenter,
    #[default]
    TopRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Self::TopLeft,
        Self::TopCenter,
        Self::TopRight,
        Self::BottomLeft,
        Self::BottomCenter,
        Self::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopCenter => "top-center",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomCenter => "bottom-center",
            Self::BottomRight => "bottom-right",
        }
    }

    /// Id of the container the controller creates for this position
    pub fn container_id(&self) -> String {
        format!("notifications-{}", self.as_str())
    }
}

/// What the caller asks to show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Numeric payload (XP amount, level, ...)
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
    /// Milliseconds; `Some(0)` = persistent, `None` = configured default
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl NotificationData {
    pub fn new(kind: NotificationType, message: &str) -> Self {
        Self {
            kind,
            title: None,
            message: Some(message.to_string()),
            value: None,
            icon: None,
            position: None,
            duration_ms: None,
        }
    }

    pub fn info(message: &str) -> Self {
        Self::new(NotificationType::Info, message)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Never auto-dismiss
    pub fn persistent(self) -> Self {
        self.duration_ms(0)
    }

    pub(crate) fn has_content(&self) -> bool {
        let has_message = self
            .message
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty());
        let has_value = self.value.is_some_and(f64::is_finite);
        has_message || has_value
    }

    // ----- payload builders -----

    pub fn xp(points: u64, source: &str) -> Self {
        let message = if source.is_empty() {
            format!("+{} XP", points)
        } else {
            format!("+{} XP · {}", points, source)
        };
        Self::new(NotificationType::Xp, &message).value(points as f64)
    }

    pub fn achievement(name: &str, description: &str, xp: u64) -> Self {
        let message = if description.is_empty() {
            format!("{} (+{} XP)", name, xp)
        } else {
            format!("{}: {} (+{} XP)", name, description, xp)
        };
        Self::new(NotificationType::Achievement, &message)
            .title("Achievement Unlocked!")
            .value(xp as f64)
    }

    pub fn level_up(new_level: u32, title: &str) -> Self {
        Self::new(
            NotificationType::LevelUp,
            &format!("Level {} · {}", new_level, title),
        )
        .title("LEVEL UP!")
        .value(f64::from(new_level))
    }

    pub fn badge(name: &str, icon: &str) -> Self {
        Self::new(NotificationType::Badge, &format!("Badge earned: {}", name)).icon(icon)
    }
}

/// `queued -> visible -> exiting -> removed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Queued,
    Visible,
    Exiting,
    Removed,
}

impl NotificationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Visible => "visible",
            Self::Exiting => "exiting",
            Self::Removed => "removed",
        }
    }
}

/// Live notification owned by the controller
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub data: NotificationData,
    pub position: Position,
    /// Zero = persistent
    pub duration: Duration,
    pub state: NotificationState,
    /// Auto-dismiss deadline while visible and running
    pub deadline: Option<Duration>,
    /// Remaining time while paused
    pub remaining: Option<Duration>,
    /// End of the exit animation while exiting
    pub exit_deadline: Option<Duration>,
}

impl NotificationRecord {
    pub fn is_paused(&self) -> bool {
        self.remaining.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_validation() {
        assert!(NotificationData::info("hello").has_content());
        assert!(!NotificationData::info("   ").has_content());

        let mut value_only = NotificationData::info("");
        value_only.value = Some(3.0);
        assert!(value_only.has_content());
    }

    #[test]
    fn test_deserialize_payload() {
        let data: NotificationData = serde_json::from_value(json!({
            "type": "level-up",
            "message": "x",
            "position": "bottom-center",
            "duration_ms": 0
        }))
        .unwrap();
        assert_eq!(data.kind, NotificationType::LevelUp);
        assert_eq!(data.position, Some(Position::BottomCenter));
        assert_eq!(data.duration_ms, Some(0));
    }

    #[test]
    fn test_builders() {
        let xp = NotificationData::xp(40, "quest");
        assert_eq!(xp.kind, NotificationType::Xp);
        assert_eq!(xp.value, Some(40.0));
        assert_eq!(xp.message.as_deref(), Some("+40 XP · quest"));

        let badge = NotificationData::badge("Helper", "🤝");
        assert_eq!(badge.icon.as_deref(), Some("🤝"));
    }
}
