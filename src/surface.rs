//! Rendering surface and markup templates
//!
//! The engine never talks to a real display. It writes markup strings into
//! named containers on a [`RenderSurface`]. Templates come from an optional
//! [`TemplateSource`]; when it is missing or fails, the built-in fallback
//! markup is used so every component renders standalone.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::error::TemplateError;

/// Container-addressed output target
pub trait RenderSurface {
    /// Create an empty container (no-op if it already exists)
    fn create_container(&self, id: &str);
    fn remove_container(&self, id: &str);
    fn has_container(&self, id: &str) -> bool;
    /// Replace the content of an existing container
    fn set_content(&self, id: &str, markup: &str);
    fn content(&self, id: &str) -> Option<String>;
}

/// In-process surface keeping container contents in a map
#[derive(Debug, Default)]
pub struct MemorySurface {
    containers: RefCell<BTreeMap<String, String>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container_ids(&self) -> Vec<String> {
        self.containers.borrow().keys().cloned().collect()
    }
}

impl RenderSurface for MemorySurface {
    fn create_container(&self, id: &str) {
        self.containers
            .borrow_mut()
            .entry(id.to_string())
            .or_default();
    }

    fn remove_container(&self, id: &str) {
        self.containers.borrow_mut().remove(id);
    }

    fn has_container(&self, id: &str) -> bool {
        self.containers.borrow().contains_key(id)
    }

    fn set_content(&self, id: &str, markup: &str) {
        if let Some(slot) = self.containers.borrow_mut().get_mut(id) {
            *slot = markup.to_string();
        }
    }

    fn content(&self, id: &str) -> Option<String> {
        self.containers.borrow().get(id).cloned()
    }
}

/// Supplier of named markup templates
pub trait TemplateSource {
    fn load_template(&self, name: &str) -> Result<String, TemplateError>;
}

/// Templates held in memory, keyed by name
#[derive(Debug, Default, Clone)]
pub struct StaticTemplates {
    templates: HashMap<String, String>,
}

impl StaticTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, markup: &str) -> Self {
        self.templates.insert(name.to_string(), markup.to_string());
        self
    }
}

impl TemplateSource for StaticTemplates {
    fn load_template(&self, name: &str) -> Result<String, TemplateError> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| TemplateError::NotFound(name.to_string()))
    }
}

pub const NOTIFICATION_TEMPLATE: &str = "notification";
pub const PROGRESS_LINEAR_TEMPLATE: &str = "progress-linear";
pub const PROGRESS_CIRCULAR_TEMPLATE: &str = "progress-circular";
pub const PROGRESS_STEPS_TEMPLATE: &str = "progress-steps";

const FALLBACK_NOTIFICATION: &str = r#"<div class="toast toast--{{type}} toast--{{state}}" data-id="{{id}}"><span class="toast__icon">{{icon}}</span><span class="toast__message">{{message}}</span></div>"#;
const FALLBACK_PROGRESS_LINEAR: &str = r#"<div class="progress progress--{{color}} progress--{{size}}" role="progressbar" aria-valuenow="{{value}}" aria-valuemax="{{total}}"><div class="progress__fill" style="width: {{percent}}%"></div><span class="progress__label">{{label}}</span></div>"#;
const FALLBACK_PROGRESS_CIRCULAR: &str = r#"<svg class="progress-ring progress--{{color}} progress--{{size}}" viewBox="0 0 100 100"><circle class="progress-ring__track" cx="50" cy="50" r="{{radius}}"/><circle class="progress-ring__fill" cx="50" cy="50" r="{{radius}}" stroke-dasharray="{{circumference}}" stroke-dashoffset="{{offset}}"/><text x="50" y="55">{{percent}}%</text></svg>"#;
const FALLBACK_PROGRESS_STEPS: &str = r#"<ol class="progress-steps progress--{{color}} progress--{{size}}" data-filled="{{filled}}">{{markers}}</ol>"#;

fn fallback(name: &str) -> &'static str {
    match name {
        NOTIFICATION_TEMPLATE => FALLBACK_NOTIFICATION,
        PROGRESS_LINEAR_TEMPLATE => FALLBACK_PROGRESS_LINEAR,
        PROGRESS_CIRCULAR_TEMPLATE => FALLBACK_PROGRESS_CIRCULAR,
        PROGRESS_STEPS_TEMPLATE => FALLBACK_PROGRESS_STEPS,
        _ => "{{content}}",
    }
}

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Template cache with fallback markup
pub struct Templates {
    source: Option<Box<dyn TemplateSource>>,
    cache: RefCell<HashMap<String, String>>,
}

impl Templates {
    /// Built-in markup only
    pub fn builtin() -> Self {
        Self {
            source: None,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn with_source(source: Box<dyn TemplateSource>) -> Self {
        Self {
            source: Some(source),
            cache: RefCell::new(HashMap::new()),
        }
    }

    fn markup_for(&self, name: &str) -> String {
        if let Some(cached) = self.cache.borrow().get(name) {
            return cached.clone();
        }

        let markup = match &self.source {
            Some(source) => match source.load_template(name) {
                Ok(markup) => markup,
                Err(e) => {
                    debug!("Using fallback markup for '{}': {}", name, e);
                    fallback(name).to_string()
                }
            },
            None => fallback(name).to_string(),
        };

        self.cache
            .borrow_mut()
            .insert(name.to_string(), markup.clone());
        markup
    }

    /// Render `name`, escaping every value. Unknown placeholders render empty.
    pub fn render(&self, name: &str, values: &[(&str, String)]) -> String {
        let markup = self.markup_for(name);
        substitute(&markup, values, true)
    }

    /// Like [`Templates::render`] but leaves values unescaped (pre-rendered markup)
    pub fn render_raw(&self, name: &str, values: &[(&str, String)]) -> String {
        let markup = self.markup_for(name);
        substitute(&markup, values, false)
    }
}

fn substitute(markup: &str, values: &[(&str, String)], escape: bool) -> String {
    PLACEHOLDER
        .replace_all(markup, |caps: &Captures| {
            let key = &caps[1];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| if escape { escape_markup(v) } else { v.clone() })
                .unwrap_or_default()
        })
        .into_owned()
}

/// Escape the five markup-significant characters
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
