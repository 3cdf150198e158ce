//! Condition trees and their interpreter
//!
//! A requirement may carry a boolean tree of [`Condition`] nodes. Leaves are
//! either a named predicate looked up in a [`PredicateRegistry`] or a numeric
//! comparison against a metadata field. Interior nodes combine children with
//! AND / OR and short-circuit left to right.

use std::collections::HashMap;
use std::fmt;

use chrono::{Datelike, Local, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Free-form data supplied with an action
pub type Metadata = serde_json::Map<String, Value>;

/// Comparison operator for numeric leaves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Eq => (lhs - rhs).abs() < f64::EPSILON,
            Self::Ne => (lhs - rhs).abs() >= f64::EPSILON,
            Self::Gt => lhs > rhs,
            Self::Gte => lhs >= rhs,
            Self::Lt => lhs < rhs,
            Self::Lte => lhs <= rhs,
        }
    }
}

/// Node of a requirement's condition tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    Predicate {
        name: String,
        #[serde(default)]
        args: Vec<Value>,
    },
    Compare {
        field: String,
        op: CompareOp,
        value: f64,
    },
    And {
        children: Vec<Condition>,
    },
    Or {
        children: Vec<Condition>,
    },
}

impl Condition {
    pub fn predicate(name: &str, args: Vec<Value>) -> Self {
        Self::Predicate {
            name: name.to_string(),
            args,
        }
    }

    pub fn compare(field: &str, op: CompareOp, value: f64) -> Self {
        Self::Compare {
            field: field.to_string(),
            op,
            value,
        }
    }

    /// Structural check: no empty groups, no blank names
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Self::Predicate { name, .. } if name.trim().is_empty() => {
                Err("predicate name is empty".to_string())
            }
            Self::Compare { field, .. } if field.trim().is_empty() => {
                Err("comparison field is empty".to_string())
            }
            Self::Compare { value, .. } if !value.is_finite() => {
                Err("comparison value is not finite".to_string())
            }
            Self::And { children } | Self::Or { children } => {
                if children.is_empty() {
                    return Err("condition group has no children".to_string());
                }
                children.iter().try_for_each(Condition::validate)
            }
            _ => Ok(()),
        }
    }
}

type PredicateFn = Box<dyn Fn(&Metadata, &[Value]) -> bool>;

/// Named predicates available to condition leaves
pub struct PredicateRegistry {
    predicates: HashMap<String, PredicateFn>,
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("PredicateRegistry")
            .field("predicates", &names)
            .finish()
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl PredicateRegistry {
    /// Registry with no predicates at all
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Registry preloaded with `has`, `equals`, `one_of`, `weekend` and `hour_between`
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();

        // has(key): key present and truthy
        registry.register("has", |meta, args| {
            first_str(args)
                .and_then(|key| meta.get(key))
                .is_some_and(is_truthy)
        });

        // equals(key, value)
        registry.register("equals", |meta, args| match (first_str(args), args.get(1)) {
            (Some(key), Some(expected)) => meta.get(key) == Some(expected),
            _ => false,
        });

        // one_of(key, [values...])
        registry.register("one_of", |meta, args| {
            match (first_str(args), args.get(1).and_then(Value::as_array)) {
                (Some(key), Some(options)) => meta.get(key).is_some_and(|v| options.contains(v)),
                _ => false,
            }
        });

        // weekend(): metadata "weekday" (0 = Monday) wins over the local calendar
        registry.register("weekend", |meta, _| {
            match meta.get("weekday").and_then(Value::as_u64) {
                Some(day) => day >= 5,
                None => matches!(Local::now().weekday(), Weekday::Sat | Weekday::Sun),
            }
        });

        // hour_between(start, end): start inclusive, end exclusive, wraps midnight
        registry.register("hour_between", |meta, args| {
            let (Some(start), Some(end)) = (
                args.first().and_then(Value::as_u64),
                args.get(1).and_then(Value::as_u64),
            ) else {
                return false;
            };
            let hour = meta
                .get("hour")
                .and_then(Value::as_u64)
                .unwrap_or_else(|| u64::from(Local::now().hour()));
            if start <= end {
                (start..end).contains(&hour)
            } else {
                hour >= start || hour < end
            }
        });

        registry
    }

    pub fn register<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&Metadata, &[Value]) -> bool + 'static,
    {
        self.predicates.insert(name.to_string(), Box::new(predicate));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Evaluate a tree. Unknown predicates are `false` and logged.
    pub fn evaluate(&self, condition: &Condition, metadata: &Metadata) -> bool {
        match condition {
            Condition::Predicate { name, args } => match self.predicates.get(name) {
                Some(predicate) => predicate(metadata, args),
                None => {
                    warn!("Unknown condition '{}', treating as false", name);
                    false
                }
            },
            Condition::Compare { field, op, value } => {
                match metadata.get(field).and_then(Value::as_f64) {
                    Some(actual) => op.apply(actual, *value),
                    None => {
                        debug!("Metadata field '{}' missing or not numeric", field);
                        false
                    }
                }
            }
            Condition::And { children } => children.iter().all(|c| self.evaluate(c, metadata)),
            Condition::Or { children } => children.iter().any(|c| self.evaluate(c, metadata)),
        }
    }
}

fn first_str(args: &[Value]) -> Option<&str> {
    args.first().and_then(Value::as_str)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}
