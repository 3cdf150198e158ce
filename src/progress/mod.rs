//! Animated progress indicators (linear, circular, steps)

mod controller;
mod indicator;
mod scheduler;

pub use controller::{ProgressController, ProgressEvent, UpdateOptions};
pub use indicator::{
    MAX_STEPS, ProgressConfig, ProgressId, ProgressKind, ProgressRecord, ProgressView, RING_RADIUS,
};
pub use scheduler::{AnimationScheduler, Easing, Frame, SETTLE_TOLERANCE};
