//! XP, levels, streaks and the orchestrating reward system

mod actions;
mod levels;
mod stats;
mod streaks;
mod system;

pub use actions::{ActionTable, MetricIncrement};
pub use levels::{Level, LevelProgress, LevelTable};
pub use stats::UserStatistics;
pub use streaks::{STREAK_METRIC, StreakChange, today};
pub use system::{ActionSender, RewardSystem, Services};
