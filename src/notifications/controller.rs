//! Notification Controller - position-bucketed toast queue
//!
//! Each position keeps a FIFO backlog and a ceiling on simultaneously
//! visible toasts. A toast occupies its slot from `visible` until it reaches
//! `removed`; the oldest queued toast of that position is then promoted.
//! Dismiss timers are deadlines checked on [`NotificationController::tick`].

use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::types::{
    NotificationData, NotificationId, NotificationRecord, NotificationState, NotificationType,
    Position,
};
use crate::clock::Clock;
use crate::config::NotificationSettings;
use crate::error::ValidationError;
use crate::events::{EventBus, NamedEvent};
use crate::surface::{NOTIFICATION_TEMPLATE, RenderSurface, Templates};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum NotificationEvent {
    Queued { id: NotificationId, position: Position },
    Shown { id: NotificationId, position: Position, sound: bool },
    Hidden { id: NotificationId },
    Removed { id: NotificationId },
}

impl NamedEvent for NotificationEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Queued { .. } => "notification-queued",
            Self::Shown { .. } => "notification-shown",
            Self::Hidden { .. } => "notification-hidden",
            Self::Removed { .. } => "notification-removed",
        }
    }
}

/// Per-position bookkeeping
#[derive(Debug, Default)]
struct Bucket {
    /// Visible and exiting toasts, oldest first
    on_screen: Vec<NotificationId>,
    queue: VecDeque<NotificationId>,
    container_created: bool,
}

/// Counts reported to callers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationStats {
    pub visible: usize,
    pub exiting: usize,
    pub queued: usize,
    pub total_shown: u64,
    pub max_visible: usize,
    pub queue_size: usize,
    pub by_position: BTreeMap<Position, usize>,
}

pub struct NotificationController {
    settings: NotificationSettings,
    clock: Rc<dyn Clock>,
    surface: Rc<dyn RenderSurface>,
    templates: Rc<Templates>,
    records: BTreeMap<NotificationId, NotificationRecord>,
    buckets: BTreeMap<Position, Bucket>,
    next_id: NotificationId,
    total_shown: u64,
    events: EventBus<NotificationEvent>,
}

impl NotificationController {
    pub fn new(
        settings: NotificationSettings,
        clock: Rc<dyn Clock>,
        surface: Rc<dyn RenderSurface>,
        templates: Rc<Templates>,
    ) -> Self {
        Self {
            settings,
            clock,
            surface,
            templates,
            records: BTreeMap::new(),
            buckets: BTreeMap::new(),
            next_id: 1,
            total_shown: 0,
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus<NotificationEvent> {
        &self.events
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    // ========================================
    // SHOW / HIDE
    // ========================================

    /// Accept a notification. It is shown at once when its position has a
    /// free slot, otherwise queued. The id is returned either way.
    pub fn show(&mut self, data: NotificationData) -> Result<NotificationId, ValidationError> {
        if !data.has_content() {
            warn!("Rejected {} notification without content", data.kind.as_str());
            return Err(ValidationError::EmptyPayload);
        }

        let id = self.next_id;
        self.next_id += 1;

        let position = data.position.unwrap_or(self.settings.default_position);
        let duration =
            Duration::from_millis(data.duration_ms.unwrap_or(self.settings.default_duration_ms));

        self.records.insert(
            id,
            NotificationRecord {
                id,
                data,
                position,
                duration,
                state: NotificationState::Queued,
                deadline: None,
                remaining: None,
                exit_deadline: None,
            },
        );

        let max_visible = self.settings.max_visible.max(1);
        let bucket = self.buckets.entry(position).or_default();
        if bucket.on_screen.len() < max_visible {
            self.make_visible(id);
        } else {
            bucket.queue.push_back(id);
            let backlog = bucket.queue.len();
            if backlog > self.settings.queue_size {
                warn!(
                    "Notification backlog at {} is {} (configured queue size {})",
                    position.as_str(),
                    backlog,
                    self.settings.queue_size
                );
            }
            debug!("Queued notification #{} at {}", id, position.as_str());
            self.events.emit(&NotificationEvent::Queued { id, position });
        }

        Ok(id)
    }

    fn make_visible(&mut self, id: NotificationId) {
        let now = self.clock.now();
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };

        record.state = NotificationState::Visible;
        record.deadline = (!record.duration.is_zero()).then(|| now + record.duration);
        let position = record.position;

        self.ensure_container(position);
        self.buckets
            .entry(position)
            .or_default()
            .on_screen
            .push(id);
        self.total_shown += 1;
        self.render_position(position);

        let sound = self.settings.enable_sound;
        if sound {
            debug!("Playing sound for notification #{}", id);
        }
        self.events.emit(&NotificationEvent::Shown {
            id,
            position,
            sound,
        });
    }

    /// Dismiss a notification: visible ones exit (animated), queued ones are
    /// dropped without ever being shown. No-op for unknown or removed ids.
    pub fn hide(&mut self, id: NotificationId) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };

        match record.state {
            NotificationState::Queued => {
                let position = record.position;
                if let Some(bucket) = self.buckets.get_mut(&position) {
                    bucket.queue.retain(|q| *q != id);
                }
                self.records.remove(&id);
                self.events.emit(&NotificationEvent::Removed { id });
                true
            }
            NotificationState::Visible => {
                record.state = NotificationState::Exiting;
                record.deadline = None;
                record.remaining = None;
                let position = record.position;

                if self.settings.enable_animations && self.settings.exit_animation_ms > 0 {
                    let exit = Duration::from_millis(self.settings.exit_animation_ms);
                    record.exit_deadline = Some(self.clock.now() + exit);
                    self.render_position(position);
                    self.events.emit(&NotificationEvent::Hidden { id });
                } else {
                    self.events.emit(&NotificationEvent::Hidden { id });
                    self.finish_removal(id);
                }
                true
            }
            NotificationState::Exiting | NotificationState::Removed => false,
        }
    }

    /// Move an on-screen toast to `removed` and promote the next queued one
    fn finish_removal(&mut self, id: NotificationId) {
        let Some(record) = self.records.remove(&id) else {
            return;
        };
        let position = record.position;

        let next = self.buckets.get_mut(&position).and_then(|bucket| {
            bucket.on_screen.retain(|v| *v != id);
            if bucket.on_screen.len() < self.settings.max_visible.max(1) {
                bucket.queue.pop_front()
            } else {
                None
            }
        });

        self.events.emit(&NotificationEvent::Removed { id });
        match next {
            Some(next) => self.make_visible(next),
            None => self.render_position(position),
        }
    }

    // ========================================
    // TIMERS
    // ========================================

    /// Fire due dismiss timers and finish due exit animations
    pub fn tick(&mut self) {
        let now = self.clock.now();

        let finished: Vec<NotificationId> = self
            .records
            .values()
            .filter(|r| r.state == NotificationState::Exiting)
            .filter(|r| r.exit_deadline.is_some_and(|d| d <= now))
            .map(|r| r.id)
            .collect();
        for id in finished {
            self.finish_removal(id);
        }

        let expired: Vec<NotificationId> = self
            .records
            .values()
            .filter(|r| r.state == NotificationState::Visible)
            .filter(|r| r.deadline.is_some_and(|d| d <= now))
            .map(|r| r.id)
            .collect();
        for id in expired {
            self.hide(id);
        }
    }

    /// Stop the dismiss countdown, keeping the remaining time
    pub fn pause(&mut self, id: NotificationId) -> bool {
        let now = self.clock.now();
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        if record.state != NotificationState::Visible || record.is_paused() {
            return false;
        }
        let Some(deadline) = record.deadline.take() else {
            return false;
        };
        record.remaining = Some(deadline.saturating_sub(now));
        true
    }

    /// Restart the countdown for the remaining time only
    pub fn resume(&mut self, id: NotificationId) -> bool {
        let now = self.clock.now();
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        if record.state != NotificationState::Visible {
            return false;
        }
        let Some(remaining) = record.remaining.take() else {
            return false;
        };
        record.deadline = Some(now + remaining);
        true
    }

    // ========================================
    // BULK REMOVAL
    // ========================================

    /// Remove every notification without exit animation
    pub fn clear_all(&mut self) {
        self.clear_matching(|_| true);
    }

    /// Remove every notification of `kind` without exit animation
    pub fn clear_by_type(&mut self, kind: NotificationType) {
        self.clear_matching(|r| r.data.kind == kind);
    }

    fn clear_matching<F>(&mut self, matches: F)
    where
        F: Fn(&NotificationRecord) -> bool,
    {
        let doomed: Vec<NotificationId> = self
            .records
            .values()
            .filter(|r| matches(*r))
            .map(|r| r.id)
            .collect();
        if doomed.is_empty() {
            return;
        }

        for id in &doomed {
            self.records.remove(id);
        }
        for bucket in self.buckets.values_mut() {
            bucket.on_screen.retain(|id| !doomed.contains(id));
            bucket.queue.retain(|id| !doomed.contains(id));
        }
        for id in &doomed {
            self.events.emit(&NotificationEvent::Removed { id: *id });
        }

        // Survivors move into the freed slots
        let max_visible = self.settings.max_visible.max(1);
        let positions: Vec<Position> = self.buckets.keys().copied().collect();
        for position in positions {
            loop {
                let next = self.buckets.get_mut(&position).and_then(|bucket| {
                    if bucket.on_screen.len() < max_visible {
                        bucket.queue.pop_front()
                    } else {
                        None
                    }
                });
                match next {
                    Some(id) => self.make_visible(id),
                    None => break,
                }
            }
            self.render_position(position);
        }
    }

    /// Drop everything, including the position containers
    pub fn destroy(&mut self) {
        self.records.clear();
        for (position, bucket) in std::mem::take(&mut self.buckets) {
            if bucket.container_created {
                self.surface.remove_container(&position.container_id());
            }
        }
        self.events.clear();
    }

    // ========================================
    // QUERIES
    // ========================================

    /// `Removed` for ids that were issued and are gone; `None` for unknown ids
    pub fn state(&self, id: NotificationId) -> Option<NotificationState> {
        match self.records.get(&id) {
            Some(record) => Some(record.state),
            None if id > 0 && id < self.next_id => Some(NotificationState::Removed),
            None => None,
        }
    }

    pub fn record(&self, id: NotificationId) -> Option<&NotificationRecord> {
        self.records.get(&id)
    }

    pub fn visible_count(&self, position: Position) -> usize {
        self.count_in(position, NotificationState::Visible)
    }

    pub fn queued_count(&self, position: Position) -> usize {
        self.buckets.get(&position).map_or(0, |b| b.queue.len())
    }

    fn count_in(&self, position: Position, state: NotificationState) -> usize {
        self.buckets.get(&position).map_or(0, |b| {
            b.on_screen
                .iter()
                .filter(|id| self.records.get(id).is_some_and(|r| r.state == state))
                .count()
        })
    }

    pub fn statistics(&self) -> NotificationStats {
        let mut stats = NotificationStats {
            total_shown: self.total_shown,
            max_visible: self.settings.max_visible,
            queue_size: self.settings.queue_size,
            ..Default::default()
        };

        for record in self.records.values() {
            match record.state {
                NotificationState::Queued => stats.queued += 1,
                NotificationState::Visible => stats.visible += 1,
                NotificationState::Exiting => stats.exiting += 1,
                NotificationState::Removed => {}
            }
            *stats.by_position.entry(record.position).or_default() += 1;
        }
        stats
    }

    // ========================================
    // CONVENIENCE BUILDERS
    // ========================================

    pub fn show_xp(&mut self, points: u64, source: &str) -> Result<NotificationId, ValidationError> {
        self.show(NotificationData::xp(points, source))
    }

    pub fn show_achievement(
        &mut self,
        name: &str,
        description: &str,
        xp: u64,
        icon: &str,
    ) -> Result<NotificationId, ValidationError> {
        let mut data = NotificationData::achievement(name, description, xp);
        if !icon.is_empty() {
            data = data.icon(icon);
        }
        self.show(data)
    }

    pub fn show_level_up(
        &mut self,
        new_level: u32,
        title: &str,
    ) -> Result<NotificationId, ValidationError> {
        self.show(NotificationData::level_up(new_level, title))
    }

    pub fn show_badge(&mut self, name: &str, icon: &str) -> Result<NotificationId, ValidationError> {
        self.show(NotificationData::badge(name, icon))
    }

    // ========================================
    // RENDERING
    // ========================================

    fn ensure_container(&mut self, position: Position) {
        let bucket = self.buckets.entry(position).or_default();
        if !bucket.container_created {
            self.surface.create_container(&position.container_id());
            bucket.container_created = true;
        }
    }

    fn render_position(&self, position: Position) {
        let Some(bucket) = self.buckets.get(&position) else {
            return;
        };
        if !bucket.container_created {
            return;
        }

        let markup: String = bucket
            .on_screen
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(|record| self.render_one(record))
            .collect();
        self.surface.set_content(&position.container_id(), &markup);
    }

    fn render_one(&self, record: &NotificationRecord) -> String {
        let data = &record.data;
        let icon = data
            .icon
            .clone()
            .unwrap_or_else(|| data.kind.default_icon().to_string());
        let message = match (&data.title, &data.message) {
            (Some(title), Some(message)) => format!("{} {}", title, message),
            (None, Some(message)) => message.clone(),
            (Some(title), None) => title.clone(),
            (None, None) => data.value.map(|v| v.to_string()).unwrap_or_default(),
        };

        self.templates.render(
            NOTIFICATION_TEMPLATE,
            &[
                ("id", record.id.to_string()),
                ("type", data.kind.as_str().to_string()),
                ("state", record.state.as_str().to_string()),
                ("position", record.position.as_str().to_string()),
                ("icon", icon),
                ("message", message),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::surface::MemorySurface;

    struct Fixture {
        clock: Rc<ManualClock>,
        surface: Rc<MemorySurface>,
        ctl: NotificationController,
    }

    fn fixture(settings: NotificationSettings) -> Fixture {
        let clock = Rc::new(ManualClock::new());
        let surface = Rc::new(MemorySurface::new());
        let ctl = NotificationController::new(
            settings,
            clock.clone(),
            surface.clone(),
            Rc::new(Templates::builtin()),
        );
        Fixture {
            clock,
            surface,
            ctl,
        }
    }

    fn settings(max_visible: usize, animations: bool) -> NotificationSettings {
        NotificationSettings {
            max_visible,
            enable_animations: animations,
            default_duration_ms: 1000,
            ..Default::default()
        }
    }

    #[test]
    fn test_ceiling_and_fifo_promotion() {
        let mut f = fixture(settings(2, false));
        let ids: Vec<_> = (0..4)
            .map(|i| f.ctl.show(NotificationData::info(&format!("n{}", i))).unwrap())
            .collect();

        assert_eq!(f.ctl.visible_count(Position::TopRight), 2);
        assert_eq!(f.ctl.queued_count(Position::TopRight), 2);
        assert_eq!(f.ctl.state(ids[2]), Some(NotificationState::Queued));

        assert!(f.ctl.hide(ids[0]));
        assert_eq!(f.ctl.state(ids[0]), Some(NotificationState::Removed));
        assert_eq!(f.ctl.state(ids[2]), Some(NotificationState::Visible));
        assert_eq!(f.ctl.state(ids[3]), Some(NotificationState::Queued));
        assert_eq!(f.ctl.visible_count(Position::TopRight), 2);
    }

    #[test]
    fn test_positions_are_independent() {
        let mut f = fixture(settings(1, false));
        f.ctl.show(NotificationData::info("a")).unwrap();
        let b = f
            .ctl
            .show(NotificationData::info("b").position(Position::BottomLeft))
            .unwrap();

        assert_eq!(f.ctl.state(b), Some(NotificationState::Visible));
        assert!(f.surface.has_container("notifications-top-right"));
        assert!(f.surface.has_container("notifications-bottom-left"));
        assert!(!f.surface.has_container("notifications-top-left"));
    }

    #[test]
    fn test_auto_dismiss_with_exit_animation() {
        let mut f = fixture(settings(1, true));
        let a = f.ctl.show(NotificationData::info("a")).unwrap();
        let b = f.ctl.show(NotificationData::info("b")).unwrap();

        f.clock.advance_ms(999);
        f.ctl.tick();
        assert_eq!(f.ctl.state(a), Some(NotificationState::Visible));

        f.clock.advance_ms(1);
        f.ctl.tick();
        assert_eq!(f.ctl.state(a), Some(NotificationState::Exiting));
        assert_eq!(f.ctl.state(b), Some(NotificationState::Queued));

        f.clock.advance_ms(300);
        f.ctl.tick();
        assert_eq!(f.ctl.state(a), Some(NotificationState::Removed));
        assert_eq!(f.ctl.state(b), Some(NotificationState::Visible));
    }

    #[test]
    fn test_persistent_notification_needs_explicit_hide() {
        let mut f = fixture(settings(3, false));
        let id = f
            .ctl
            .show(NotificationData::info("x").persistent())
            .unwrap();

        f.clock.advance(Duration::from_secs(3600));
        f.ctl.tick();
        assert_eq!(f.ctl.state(id), Some(NotificationState::Visible));

        assert!(f.ctl.hide(id));
        assert_eq!(f.ctl.state(id), Some(NotificationState::Removed));
        assert!(!f.ctl.hide(id));
    }

    #[test]
    fn test_pause_resume_preserves_lifetime() {
        let mut f = fixture(settings(1, false));
        let id = f.ctl.show(NotificationData::info("x")).unwrap();

        f.clock.advance_ms(400);
        assert!(f.ctl.pause(id));
        f.clock.advance_ms(10_000);
        f.ctl.tick();
        assert_eq!(f.ctl.state(id), Some(NotificationState::Visible));

        assert!(f.ctl.resume(id));
        f.clock.advance_ms(599);
        f.ctl.tick();
        assert_eq!(f.ctl.state(id), Some(NotificationState::Visible));

        f.clock.advance_ms(1);
        f.ctl.tick();
        assert_eq!(f.ctl.state(id), Some(NotificationState::Removed));
    }

    #[test]
    fn test_hide_queued_never_displays() {
        let mut f = fixture(settings(1, false));
        let a = f.ctl.show(NotificationData::info("a")).unwrap();
        let b = f.ctl.show(NotificationData::info("b")).unwrap();
        let c = f.ctl.show(NotificationData::info("c")).unwrap();

        assert!(f.ctl.hide(b));
        assert!(f.ctl.hide(a));
        assert_eq!(f.ctl.state(c), Some(NotificationState::Visible));
        assert_eq!(f.ctl.statistics().total_shown, 2);
    }

    #[test]
    fn test_clear_by_type_promotes_survivors() {
        let mut f = fixture(settings(1, true));
        let xp = f.ctl.show_xp(10, "quest").unwrap();
        let info = f.ctl.show(NotificationData::info("still here")).unwrap();

        f.ctl.clear_by_type(NotificationType::Xp);
        assert_eq!(f.ctl.state(xp), Some(NotificationState::Removed));
        assert_eq!(f.ctl.state(info), Some(NotificationState::Visible));

        f.ctl.clear_all();
        assert_eq!(f.ctl.state(info), Some(NotificationState::Removed));
        assert_eq!(f.ctl.statistics().visible, 0);
        assert_eq!(f.surface.content("notifications-top-right").as_deref(), Some(""));
    }

    #[test]
    fn test_empty_payload_rejected() {
        let mut f = fixture(settings(1, false));
        assert_eq!(
            f.ctl.show(NotificationData::info("")),
            Err(ValidationError::EmptyPayload)
        );
        assert_eq!(f.ctl.statistics().visible, 0);
    }

    #[test]
    fn test_destroy_removes_owned_containers_and_timers() {
        let mut f = fixture(settings(1, true));
        let id = f.ctl.show(NotificationData::info("a")).unwrap();
        f.ctl.destroy();

        assert!(!f.surface.has_container("notifications-top-right"));
        f.clock.advance_ms(5000);
        f.ctl.tick();
        assert_eq!(f.ctl.state(id), Some(NotificationState::Removed));
    }

    #[test]
    fn test_rendered_markup_escapes_message() {
        let mut f = fixture(settings(2, false));
        f.ctl.show(NotificationData::info("<b>bold</b>")).unwrap();
        let html = f.surface.content("notifications-top-right").unwrap();
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains("toast--visible"));
    }
}
