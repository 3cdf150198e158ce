//! Progress Controller - visual progress indicators
//!
//! Each indicator renders into a container owned by the caller. Value changes
//! go through the shared [`AnimationScheduler`]; the controller never keeps
//! per-indicator timers.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use super::indicator::{
    MAX_STEPS, ProgressConfig, ProgressId, ProgressKind, ProgressRecord, ProgressView,
};
use super::scheduler::{AnimationScheduler, SETTLE_TOLERANCE};
use crate::clock::Clock;
use crate::config::ProgressSettings;
use crate::error::ValidationError;
use crate::events::{EventBus, NamedEvent};
use crate::surface::{RenderSurface, Templates};

/// Options for a single update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateOptions {
    /// Override animation for this update only
    pub animate: Option<bool>,
}

impl UpdateOptions {
    pub fn instant() -> Self {
        Self {
            animate: Some(false),
        }
    }

    pub fn animated() -> Self {
        Self {
            animate: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ProgressEvent {
    /// A new target was accepted
    Updated { id: ProgressId, current: f64, total: f64 },
    /// The displayed value reached its target
    Settled { id: ProgressId, value: f64 },
    /// The target reached the total
    Completed { id: ProgressId },
}

impl NamedEvent for ProgressEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "progress-changed",
            Self::Settled { .. } => "progress-settled",
            Self::Completed { .. } => "progress-completed",
        }
    }
}

pub struct ProgressController {
    settings: ProgressSettings,
    clock: Rc<dyn Clock>,
    surface: Rc<dyn RenderSurface>,
    templates: Rc<Templates>,
    records: BTreeMap<ProgressId, ProgressRecord>,
    scheduler: AnimationScheduler,
    next_id: ProgressId,
    events: EventBus<ProgressEvent>,
}

impl ProgressController {
    pub fn new(
        settings: ProgressSettings,
        clock: Rc<dyn Clock>,
        surface: Rc<dyn RenderSurface>,
        templates: Rc<Templates>,
    ) -> Self {
        let scheduler = AnimationScheduler::new(
            Duration::from_millis(settings.animation_duration_ms),
            settings.easing,
        );
        Self {
            settings,
            clock,
            surface,
            templates,
            records: BTreeMap::new(),
            scheduler,
            next_id: 1,
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus<ProgressEvent> {
        &self.events
    }

    /// Bind a new indicator to an existing container
    pub fn create_progress(
        &mut self,
        container_id: &str,
        config: ProgressConfig,
    ) -> Result<ProgressId, ValidationError> {
        if let Err(e) = Self::validate(container_id, &config, self.surface.as_ref()) {
            warn!("Rejected progress indicator: {}", e);
            return Err(e);
        }

        let id = self.next_id;
        self.next_id += 1;

        let current = config.current.clamp(0.0, config.total);
        let step_count = match config.kind {
            ProgressKind::Steps => config
                .step_count
                .unwrap_or_else(|| {
                    config.total.round().clamp(1.0, f64::from(MAX_STEPS)) as u32
                }),
            _ => config.step_count.unwrap_or(0),
        };

        let record = ProgressRecord {
            id,
            container_id: container_id.to_string(),
            kind: config.kind,
            current,
            total: config.total,
            color: config.color,
            size: config.size,
            step_count,
            label: config.label,
            animate: config.animate,
            displayed: current,
            animating: false,
        };

        debug!("Created {} progress #{} in '{}'", record.kind.as_str(), id, container_id);
        self.render(&record);
        self.records.insert(id, record);
        Ok(id)
    }

    fn validate(
        container_id: &str,
        config: &ProgressConfig,
        surface: &dyn RenderSurface,
    ) -> Result<(), ValidationError> {
        if container_id.trim().is_empty() {
            return Err(ValidationError::MissingField("container_id"));
        }
        if !surface.has_container(container_id) {
            return Err(ValidationError::MissingContainer(container_id.to_string()));
        }
        if !(config.total.is_finite() && config.total > 0.0) {
            return Err(ValidationError::InvalidTotal(config.total));
        }
        if !config.current.is_finite() {
            return Err(ValidationError::InvalidValue(config.current));
        }
        if let Some(count) = config.step_count {
            if config.kind == ProgressKind::Steps && !(1..=MAX_STEPS).contains(&count) {
                return Err(ValidationError::InvalidStepCount {
                    count,
                    max: MAX_STEPS,
                });
            }
        }
        Ok(())
    }

    /// Set a new target value, optionally with a new total.
    ///
    /// While an animation is in flight only its target is replaced, so the
    /// newest value always wins and there is never more than one pending
    /// transition per indicator.
    pub fn update_progress(
        &mut self,
        id: ProgressId,
        current: f64,
        total: Option<f64>,
        options: UpdateOptions,
    ) -> Result<(), ValidationError> {
        let Some(record) = self.records.get_mut(&id) else {
            warn!("Update for unknown progress #{}", id);
            return Err(ValidationError::UnknownIndicator(id));
        };

        if !current.is_finite() {
            warn!("Rejected value {} for progress #{}", current, id);
            return Err(ValidationError::InvalidValue(current));
        }
        if let Some(total) = total {
            if !(total.is_finite() && total > 0.0) {
                warn!("Rejected total {} for progress #{}", total, id);
                return Err(ValidationError::InvalidTotal(total));
            }
            record.total = total;
        }

        let animate = options
            .animate
            .or(record.animate)
            .unwrap_or(self.settings.enable_animations);

        let target = current.clamp(0.0, record.total);
        let changed = (target - record.current).abs() > SETTLE_TOLERANCE || total.is_some();
        if !changed {
            // Same target, but an instant update still cuts a running animation short
            if !animate && self.scheduler.is_active(id) {
                self.scheduler.cancel(id);
                record.displayed = target;
                record.animating = false;
                if let Some(record) = self.records.get(&id) {
                    self.render(record);
                }
                self.events.emit(&ProgressEvent::Settled { id, value: target });
            }
            return Ok(());
        }

        let was_complete = record.is_complete();
        record.current = target;

        if animate {
            self.scheduler
                .schedule(id, record.displayed, target, self.clock.now());
            record.animating = self.scheduler.is_active(id);
        } else {
            self.scheduler.cancel(id);
            record.displayed = target;
            record.animating = false;
        }

        let total = record.total;
        let completed = !was_complete && record.is_complete();
        let render_now = !animate || !self.settings.batch_updates;

        if render_now {
            if let Some(record) = self.records.get(&id) {
                self.render(record);
            }
        }

        self.events.emit(&ProgressEvent::Updated {
            id,
            current: target,
            total,
        });
        if !animate {
            self.events.emit(&ProgressEvent::Settled { id, value: target });
        }
        if completed {
            self.events.emit(&ProgressEvent::Completed { id });
        }
        Ok(())
    }

    /// Advance every running animation to the clock's current time
    pub fn tick(&mut self) {
        if self.scheduler.active_count() == 0 {
            return;
        }

        let frames = self.scheduler.advance(self.clock.now());
        for frame in frames {
            let Some(record) = self.records.get_mut(&frame.id) else {
                continue;
            };
            record.displayed = frame.value;
            record.animating = !frame.settled;

            if let Some(record) = self.records.get(&frame.id) {
                self.render(record);
            }
            if frame.settled {
                self.events.emit(&ProgressEvent::Settled {
                    id: frame.id,
                    value: frame.value,
                });
            }
        }
    }

    /// Drop to zero without animation
    pub fn reset(&mut self, id: ProgressId) -> Result<(), ValidationError> {
        self.update_progress(id, 0.0, None, UpdateOptions::instant())
    }

    /// Jump (or animate) to the total
    pub fn complete(&mut self, id: ProgressId, animate: bool) -> Result<(), ValidationError> {
        let total = self
            .records
            .get(&id)
            .map(|r| r.total)
            .ok_or(ValidationError::UnknownIndicator(id))?;
        let options = UpdateOptions {
            animate: Some(animate),
        };
        self.update_progress(id, total, None, options)
    }

    /// Detach an indicator and clear its container. Idempotent.
    pub fn remove_progress(&mut self, id: ProgressId) -> bool {
        self.scheduler.cancel(id);
        match self.records.remove(&id) {
            Some(record) => {
                self.surface.set_content(&record.container_id, "");
                debug!("Removed progress #{}", id);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self, id: ProgressId) -> Option<&ProgressRecord> {
        self.records.get(&id)
    }

    pub fn view(&self, id: ProgressId) -> Option<ProgressView> {
        self.records.get(&id).map(ProgressRecord::view)
    }

    pub fn is_animating(&self, id: ProgressId) -> bool {
        self.scheduler.is_active(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove every indicator and stop all animations
    pub fn destroy(&mut self) {
        self.scheduler.clear();
        let ids: Vec<ProgressId> = self.records.keys().copied().collect();
        for id in ids {
            self.remove_progress(id);
        }
        self.events.clear();
    }

    fn render(&self, record: &ProgressRecord) {
        let markup = record.render(&self.templates);
        self.surface.set_content(&record.container_id, &markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::progress::Easing;
    use crate::surface::MemorySurface;
    use std::cell::RefCell;

    struct Fixture {
        clock: Rc<ManualClock>,
        surface: Rc<MemorySurface>,
        controller: ProgressController,
    }

    fn fixture(settings: ProgressSettings) -> Fixture {
        let clock = Rc::new(ManualClock::new());
        let surface = Rc::new(MemorySurface::new());
        surface.create_container("bar1");
        let controller = ProgressController::new(
            settings,
            clock.clone(),
            surface.clone(),
            Rc::new(Templates::builtin()),
        );
        Fixture {
            clock,
            surface,
            controller,
        }
    }

    fn linear_settings() -> ProgressSettings {
        ProgressSettings {
            animation_duration_ms: 100,
            easing: Easing::Linear,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let mut f = fixture(linear_settings());
        let linear = ProgressConfig::new(ProgressKind::Linear, 10.0);

        assert_eq!(
            f.controller
                .create_progress("bar1", ProgressConfig::new(ProgressKind::Linear, 0.0)),
            Err(ValidationError::InvalidTotal(0.0))
        );
        assert_eq!(
            f.controller.create_progress("missing", linear.clone()),
            Err(ValidationError::MissingContainer("missing".into()))
        );
        assert!(ProgressConfig::parse("hexagon", 10.0).is_err());
        assert!(f.controller.create_progress("bar1", linear).is_ok());
    }

    #[test]
    fn test_coalesced_updates_settle_on_latest_target() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress("bar1", ProgressConfig::new(ProgressKind::Linear, 10.0))
            .unwrap();

        let settled = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&settled);
        let _sub = f.controller.events().on("progress-settled", move |e| {
            if let ProgressEvent::Settled { value, .. } = e {
                sink.borrow_mut().push(*value);
            }
        });

        f.controller
            .update_progress(id, 4.0, None, UpdateOptions::default())
            .unwrap();
        f.clock.advance_ms(30);
        f.controller.tick();
        f.controller
            .update_progress(id, 9.0, None, UpdateOptions::default())
            .unwrap();

        let mut seen = Vec::new();
        for _ in 0..10 {
            f.clock.advance_ms(16);
            f.controller.tick();
            seen.push(f.controller.snapshot(id).unwrap().displayed);
        }

        assert_eq!(f.controller.snapshot(id).unwrap().displayed, 9.0);
        assert!(seen.windows(2).all(|w| w[1] >= w[0]));
        assert_eq!(settled.borrow().as_slice(), &[9.0]);
        assert!(!f.controller.is_animating(id));
    }

    #[test]
    fn test_disabled_animation_applies_immediately() {
        let settings = ProgressSettings {
            enable_animations: false,
            ..Default::default()
        };
        let mut f = fixture(settings);
        let id = f
            .controller
            .create_progress("bar1", ProgressConfig::new(ProgressKind::Linear, 10.0))
            .unwrap();

        f.controller
            .update_progress(id, 25.0, None, UpdateOptions::default())
            .unwrap();
        let record = f.controller.snapshot(id).unwrap();
        assert_eq!(record.current, 10.0);
        assert_eq!(record.displayed, 10.0);
        assert!(f.surface.content("bar1").unwrap().contains("width: 100%"));
    }

    #[test]
    fn test_reset_and_complete() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress(
                "bar1",
                ProgressConfig::new(ProgressKind::Steps, 5.0).current(3.0),
            )
            .unwrap();

        let completed = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&completed);
        let _sub = f
            .controller
            .events()
            .on("progress-completed", move |_| *sink.borrow_mut() += 1);

        f.controller.complete(id, false).unwrap();
        assert_eq!(f.controller.view(id), Some(ProgressView::Steps { filled: 5, count: 5 }));
        assert_eq!(*completed.borrow(), 1);

        f.controller.reset(id).unwrap();
        let record = f.controller.snapshot(id).unwrap();
        assert_eq!(record.displayed, 0.0);
        assert!(!f.controller.is_animating(id));
    }

    #[test]
    fn test_non_finite_value_keeps_prior_state() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress("bar1", ProgressConfig::new(ProgressKind::Linear, 10.0))
            .unwrap();
        f.controller
            .update_progress(id, 7.0, None, UpdateOptions::instant())
            .unwrap();

        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                f.controller
                    .update_progress(id, bad, Some(20.0), UpdateOptions::instant()),
                Err(ValidationError::InvalidValue(_))
            ));
        }
        let record = f.controller.snapshot(id).unwrap();
        assert_eq!(record.current, 7.0);
        assert_eq!(record.displayed, 7.0);
        assert_eq!(record.total, 10.0);

        assert!(matches!(
            f.controller.create_progress(
                "bar1",
                ProgressConfig::new(ProgressKind::Linear, 10.0).current(f64::NAN)
            ),
            Err(ValidationError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_instant_reset_and_complete_stop_running_animation() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress(
                "bar1",
                ProgressConfig::new(ProgressKind::Linear, 10.0).current(8.0),
            )
            .unwrap();

        // Animating down toward 0, then reset while still in flight
        f.controller
            .update_progress(id, 0.0, None, UpdateOptions::animated())
            .unwrap();
        f.clock.advance_ms(10);
        f.controller.tick();
        assert!(f.controller.is_animating(id));
        f.controller.reset(id).unwrap();
        let record = f.controller.snapshot(id).unwrap();
        assert_eq!(record.displayed, 0.0);
        assert!(!record.animating);
        assert!(!f.controller.is_animating(id));

        // Animating up toward the total, then complete without animation
        f.controller
            .update_progress(id, 10.0, None, UpdateOptions::animated())
            .unwrap();
        f.clock.advance_ms(10);
        f.controller.tick();
        assert!(f.controller.is_animating(id));
        f.controller.complete(id, false).unwrap();
        let record = f.controller.snapshot(id).unwrap();
        assert_eq!(record.displayed, 10.0);
        assert!(!f.controller.is_animating(id));
        assert!(f.surface.content("bar1").unwrap().contains("width: 100%"));

        f.clock.advance_ms(500);
        f.controller.tick();
        assert_eq!(f.controller.snapshot(id).unwrap().displayed, 10.0);
    }

    #[test]
    fn test_step_count_is_bounded() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress("bar1", ProgressConfig::new(ProgressKind::Steps, 2e6))
            .unwrap();
        assert_eq!(f.controller.snapshot(id).unwrap().step_count, MAX_STEPS);
        let markers = f.surface.content("bar1").unwrap().matches("<li").count();
        assert_eq!(markers, MAX_STEPS as usize);

        assert_eq!(
            f.controller.create_progress(
                "bar1",
                ProgressConfig::new(ProgressKind::Steps, 10.0).steps(MAX_STEPS + 1)
            ),
            Err(ValidationError::InvalidStepCount {
                count: MAX_STEPS + 1,
                max: MAX_STEPS
            })
        );
        assert!(matches!(
            f.controller
                .create_progress("bar1", ProgressConfig::new(ProgressKind::Steps, 10.0).steps(0)),
            Err(ValidationError::InvalidStepCount { count: 0, .. })
        ));
    }

    #[test]
    fn test_remove_is_idempotent_and_stops_animation() {
        let mut f = fixture(linear_settings());
        let id = f
            .controller
            .create_progress("bar1", ProgressConfig::new(ProgressKind::Circular, 10.0))
            .unwrap();
        f.controller
            .update_progress(id, 5.0, None, UpdateOptions::animated())
            .unwrap();
        assert!(f.controller.is_animating(id));

        assert!(f.controller.remove_progress(id));
        assert!(!f.controller.remove_progress(id));
        assert!(!f.controller.is_animating(id));
        assert!(f.surface.has_container("bar1"));
        assert_eq!(f.surface.content("bar1").as_deref(), Some(""));

        f.clock.advance_ms(500);
        f.controller.tick();
        assert_eq!(f.surface.content("bar1").as_deref(), Some(""));
    }

    #[test]
    fn test_unknown_indicator_rejected() {
        let mut f = fixture(linear_settings());
        assert_eq!(
            f.controller
                .update_progress(99, 1.0, None, UpdateOptions::default()),
            Err(ValidationError::UnknownIndicator(99))
        );
    }
}
