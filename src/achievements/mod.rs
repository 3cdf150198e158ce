//! Achievements: definitions, condition trees, progress and earn evaluation

mod catalog;
mod conditions;
mod controller;
mod definitions;
mod statistics;

pub use catalog::{default_catalog, load_catalog};
pub use conditions::{CompareOp, Condition, Metadata, PredicateRegistry};
pub use controller::{AchievementController, ProgressView};
pub use definitions::{Achievement, AchievementDef, Category, Rarity, Requirement};
pub use statistics::{AchievementStatistics, Tally};
