//! Progress indicator records and their render views

use std::f64::consts::PI;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::surface::{
    PROGRESS_CIRCULAR_TEMPLATE, PROGRESS_LINEAR_TEMPLATE, PROGRESS_STEPS_TEMPLATE, Templates,
};

/// Radius of the circular indicator in its 100x100 view box
pub const RING_RADIUS: f64 = 45.0;

pub type ProgressId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressKind {
    Linear,
    Circular,
    Steps,
}

impl ProgressKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Circular => "circular",
            Self::Steps => "steps",
        }
    }
}

impl FromStr for ProgressKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "bar" => Ok(Self::Linear),
            "circular" | "ring" => Ok(Self::Circular),
            "steps" | "stepped" => Ok(Self::Steps),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }
}

/// Options for [`super::ProgressController::create_progress`]
/// Upper bound on `steps` markers
pub const MAX_STEPS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressConfig {
    pub kind: ProgressKind,
    pub total: f64,
    #[serde(default)]
    pub current: f64,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_size")]
    pub size: String,
    /// Marker count for `steps`; defaults to `total` rounded, at most [`MAX_STEPS`]
    #[serde(default)]
    pub step_count: Option<u32>,
    #[serde(default)]
    pub label: Option<String>,
    /// Per-indicator override of the controller's animation setting
    #[serde(default)]
    pub animate: Option<bool>,
}

fn default_color() -> String {
    "primary".to_string()
}

fn default_size() -> String {
    "md".to_string()
}

impl ProgressConfig {
    pub fn new(kind: ProgressKind, total: f64) -> Self {
        Self {
            kind,
            total,
            current: 0.0,
            color: default_color(),
            size: default_size(),
            step_count: None,
            label: None,
            animate: None,
        }
    }

    /// Parse the kind from a string, rejecting unknown kinds
    pub fn parse(kind: &str, total: f64) -> Result<Self, ValidationError> {
        Ok(Self::new(kind.parse()?, total))
    }

    pub fn color(mut self, color: &str) -> Self {
        self.color = color.to_string();
        self
    }

    pub fn size(mut self, size: &str) -> Self {
        self.size = size.to_string();
        self
    }

    pub fn steps(mut self, count: u32) -> Self {
        self.step_count = Some(count);
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn current(mut self, current: f64) -> Self {
        self.current = current;
        self
    }

    pub fn animate(mut self, animate: bool) -> Self {
        self.animate = Some(animate);
        self
    }
}

/// Live state of one indicator
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressRecord {
    pub id: ProgressId,
    pub container_id: String,
    pub kind: ProgressKind,
    /// Requested value
    pub current: f64,
    pub total: f64,
    pub color: String,
    pub size: String,
    pub step_count: u32,
    pub label: Option<String>,
    pub animate: Option<bool>,
    /// Value on screen; lags `current` while animating
    pub displayed: f64,
    pub animating: bool,
}

/// Geometry of the displayed value, per kind
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressView {
    Linear {
        percent: f64,
    },
    Circular {
        percent: f64,
        circumference: f64,
        dash_offset: f64,
    },
    Steps {
        filled: u32,
        count: u32,
    },
}

impl ProgressRecord {
    pub fn ratio(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.displayed / self.total).clamp(0.0, 1.0)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }

    pub fn view(&self) -> ProgressView {
        let ratio = self.ratio();
        match self.kind {
            ProgressKind::Linear => ProgressView::Linear {
                percent: ratio * 100.0,
            },
            ProgressKind::Circular => {
                let circumference = 2.0 * PI * RING_RADIUS;
                ProgressView::Circular {
                    percent: ratio * 100.0,
                    circumference,
                    dash_offset: circumference * (1.0 - ratio),
                }
            }
            ProgressKind::Steps => ProgressView::Steps {
                filled: ((ratio * self.step_count as f64).floor() as u32).min(self.step_count),
                count: self.step_count,
            },
        }
    }

    /// Markup for the indicator's container
    pub fn render(&self, templates: &Templates) -> String {
        let label = self.label.clone().unwrap_or_default();
        let mut values = vec![
            ("id", self.id.to_string()),
            ("color", self.color.clone()),
            ("size", self.size.clone()),
            ("value", format_number(self.displayed)),
            ("total", format_number(self.total)),
            ("label", label),
        ];

        match self.view() {
            ProgressView::Linear { percent } => {
                values.push(("percent", format_number(percent)));
                templates.render(PROGRESS_LINEAR_TEMPLATE, &values)
            }
            ProgressView::Circular {
                percent,
                circumference,
                dash_offset,
            } => {
                values.push(("percent", format_number(percent)));
                values.push(("radius", format_number(RING_RADIUS)));
                values.push(("circumference", format!("{:.2}", circumference)));
                values.push(("offset", format!("{:.2}", dash_offset)));
                templates.render(PROGRESS_CIRCULAR_TEMPLATE, &values)
            }
            ProgressView::Steps { filled, count } => {
                let markers: String = (0..count)
                    .map(|i| {
                        let state = if i < filled { "filled" } else { "empty" };
                        format!(r#"<li class="progress-steps__marker is-{}"></li>"#, state)
                    })
                    .collect();
                values.push(("filled", filled.to_string()));
                values.push(("markers", markers));
                // markers are generated markup, everything else is plain text
                let escaped: Vec<(&str, String)> = values
                    .into_iter()
                    .map(|(k, v)| {
                        if k == "markers" {
                            (k, v)
                        } else {
                            (k, crate::surface::escape_markup(&v))
                        }
                    })
                    .collect();
                templates.render_raw(PROGRESS_STEPS_TEMPLATE, &escaped)
            }
        }
    }
}

/// Trim trailing zeros: 40.0 -> "40", 12.5 -> "12.5"
fn format_number(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(kind: ProgressKind, displayed: f64, total: f64, steps: u32) -> ProgressRecord {
        ProgressRecord {
            id: 1,
            container_id: "c".into(),
            kind,
            current: displayed,
            total,
            color: "primary".into(),
            size: "md".into(),
            step_count: steps,
            label: None,
            animate: None,
            displayed,
            animating: false,
        }
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Circular".parse::<ProgressKind>().unwrap(), ProgressKind::Circular);
        assert_eq!(
            "spiral".parse::<ProgressKind>(),
            Err(ValidationError::UnknownKind("spiral".into()))
        );
    }

    #[test]
    fn test_circular_dash_offset() {
        let r = record(ProgressKind::Circular, 25.0, 100.0, 0);
        let ProgressView::Circular {
            circumference,
            dash_offset,
            ..
        } = r.view()
        else {
            panic!("expected circular view");
        };
        assert!((dash_offset - circumference * 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_steps_fill_floor() {
        let r = record(ProgressKind::Steps, 7.0, 10.0, 4);
        assert_eq!(r.view(), ProgressView::Steps { filled: 2, count: 4 });

        let html = r.render(&Templates::builtin());
        assert_eq!(html.matches("is-filled").count(), 2);
        assert_eq!(html.matches("is-empty").count(), 2);
    }

    #[test]
    fn test_linear_render() {
        let r = record(ProgressKind::Linear, 4.0, 10.0, 0);
        let html = r.render(&Templates::builtin());
        assert!(html.contains("width: 40%"));
        assert!(html.contains(r#"aria-valuemax="10""#));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(40.0), "40");
        assert_eq!(format_number(12.5), "12.5");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
    }
}
