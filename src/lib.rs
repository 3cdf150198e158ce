//! rewardkit - achievements, XP and toast presentation for interactive apps
//!
//! The engine is split into four cooperating parts:
//!
//! - [`achievements::AchievementController`] owns definitions and per-user
//!   progress and decides when an achievement is earned.
//! - [`progress::ProgressController`] renders animated progress indicators
//!   into caller-owned containers.
//! - [`notifications::NotificationController`] queues toasts per screen
//!   position and dismisses them on timers.
//! - [`rewards::RewardSystem`] maps user actions to metrics, awards XP,
//!   levels the player up and persists everything.
//!
//! Nothing here talks to a real display or clock directly: rendering goes
//! through a [`surface::RenderSurface`], time through a [`clock::Clock`] and
//! persistence through a [`storage::ProgressStore`]. Timers and animations
//! advance when the host calls `tick()`.

pub mod achievements;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod notifications;
pub mod progress;
pub mod rewards;
pub mod storage;
pub mod surface;

pub use config::Config;
pub use error::{StorageError, TemplateError, ValidationError};
pub use events::{EventBus, RewardEvent, Subscription};
pub use rewards::{RewardSystem, Services};
