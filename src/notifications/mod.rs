//! Toast notifications with per-position queues and dismiss timers

mod controller;
mod types;

pub use controller::{NotificationController, NotificationEvent, NotificationStats};
pub use types::{
    NotificationData, NotificationId, NotificationRecord, NotificationState, NotificationType,
    Position,
};
