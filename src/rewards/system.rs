//! Reward System - orchestrates achievements, XP, levels and presentation
//!
//! Actions are mapped to metric increments and fed into the
//! [`AchievementController`]. Its events are collected in an inbox and
//! handled after each progress update: earned achievements award XP, XP may
//! level the player up, and both end up as toast notifications.
//!
//! Listeners cannot call back into the system while it is borrowed; they
//! enqueue follow-up actions through an [`ActionSender`] instead. Queued
//! actions are drained in order before the outer `track_action` returns.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::actions::ActionTable;
use super::levels::{LevelProgress, LevelTable};
use super::stats::UserStatistics;
use super::streaks::{STREAK_METRIC, today};
use crate::achievements::{
    AchievementController, AchievementDef, Metadata, PredicateRegistry, Requirement,
    default_catalog, load_catalog,
};
use crate::clock::{Clock, SystemClock, now_ms};
use crate::config::Config;
use crate::error::ValidationError;
use crate::events::{EventBus, RewardEvent, Subscription};
use crate::notifications::NotificationController;
use crate::progress::{ProgressConfig, ProgressController, ProgressId, ProgressKind, UpdateOptions};
use crate::storage::{ProgressStore, SaveSlot};
use crate::surface::{RenderSurface, Templates};

/// Follow-up actions processed per outer call before the rest is dropped
const MAX_CHAINED_ACTIONS: usize = 64;

/// Collaborators injected into a [`RewardSystem`]
#[derive(Clone)]
pub struct Services {
    pub clock: Rc<dyn Clock>,
    pub surface: Rc<dyn RenderSurface>,
    pub store: Rc<dyn ProgressStore>,
    pub templates: Rc<Templates>,
}

impl Services {
    /// Wall clock and built-in templates
    pub fn new(store: Rc<dyn ProgressStore>, surface: Rc<dyn RenderSurface>) -> Self {
        Self {
            clock: Rc::new(SystemClock::new()),
            surface,
            store,
            templates: Rc::new(Templates::builtin()),
        }
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn templates(mut self, templates: Templates) -> Self {
        self.templates = Rc::new(templates);
        self
    }
}

#[derive(Debug, Clone)]
struct QueuedAction {
    action: String,
    metadata: Metadata,
}

type ActionQueue = Rc<RefCell<VecDeque<QueuedAction>>>;

/// Cloneable handle for enqueueing actions from inside listeners
#[derive(Clone)]
pub struct ActionSender {
    queue: Weak<RefCell<VecDeque<QueuedAction>>>,
}

impl ActionSender {
    /// Queue an action. Returns `false` once the system is gone.
    pub fn send(&self, action: &str, metadata: Metadata) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        queue.borrow_mut().push_back(QueuedAction {
            action: action.to_string(),
            metadata,
        });
        true
    }
}

pub struct RewardSystem {
    config: Config,
    slot: SaveSlot,
    achievements: AchievementController,
    notifications: NotificationController,
    progress: ProgressController,
    levels: LevelTable,
    actions: ActionTable,
    stats: UserStatistics,
    events: EventBus<RewardEvent>,
    /// Events raised by the achievement controller, handled after each update
    inbox: Rc<RefCell<VecDeque<RewardEvent>>>,
    inbox_subscription: Option<Subscription>,
    pending: ActionQueue,
    xp_bar: Option<ProgressId>,
    initialized: bool,
}

impl RewardSystem {
    /// Build the controllers. Persisted achievement progress is loaded here;
    /// statistics and the catalog are loaded by [`RewardSystem::initialize`].
    pub fn new(config: Config, services: Services) -> Self {
        let slot = SaveSlot::new(services.store);
        let achievements = AchievementController::new(
            config.achievements.clone(),
            slot.clone(),
            PredicateRegistry::with_builtins(),
        );
        let notifications = NotificationController::new(
            config.notifications.clone(),
            services.clock.clone(),
            services.surface.clone(),
            services.templates.clone(),
        );
        let progress = ProgressController::new(
            config.progress.clone(),
            services.clock,
            services.surface,
            services.templates,
        );
        let actions = ActionTable::with_overrides(&config.actions);

        Self {
            config,
            slot,
            achievements,
            notifications,
            progress,
            levels: LevelTable::standard(),
            actions,
            stats: UserStatistics::default(),
            events: EventBus::new(),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
            inbox_subscription: None,
            pending: Rc::new(RefCell::new(VecDeque::new())),
            xp_bar: None,
            initialized: false,
        }
    }

    /// Load statistics, register the catalog and wire achievement events.
    /// Returns `false` when already initialized.
    pub fn initialize(&mut self) -> bool {
        if self.initialized {
            debug!("Reward system already initialized");
            return false;
        }

        let data = self.slot.current();
        let mut stats = data.statistics;
        stats.total_xp = data.xp;
        stats.level = data
            .level
            .max(stats.level)
            .max(self.levels.for_xp(data.xp).level);
        if stats.joined_at.is_none() {
            stats.joined_at = Some(now_ms());
        }
        self.stats = stats;

        self.register_catalog();

        let inbox = Rc::clone(&self.inbox);
        self.inbox_subscription = Some(
            self.achievements
                .events()
                .subscribe(move |event| inbox.borrow_mut().push_back(event.clone())),
        );

        self.initialized = true;
        self.save_statistics();
        info!(
            "Reward system ready: level {}, {} XP, {} achievements",
            self.stats.level,
            self.stats.total_xp,
            self.achievements.achievements().count()
        );
        true
    }

    /// Register the catalog file, then defaults. Ids already registered (by
    /// the host, or by an initialization before [`RewardSystem::destroy`])
    /// are skipped.
    fn register_catalog(&mut self) {
        if let Some(path) = self.config.achievements.catalog_path.clone() {
            match load_catalog(&path) {
                Ok(defs) => {
                    let fresh = self.unregistered(defs);
                    let count = self.achievements.register_all(fresh);
                    debug!("Registered {} achievements from {}", count, path.display());
                }
                Err(e) => warn!("Failed to load achievement catalog: {:#}", e),
            }
        }

        if self.config.achievements.include_defaults {
            let defaults = self.unregistered(default_catalog());
            self.achievements.register_all(defaults);
        }
    }

    fn unregistered(&self, defs: Vec<AchievementDef>) -> Vec<AchievementDef> {
        defs.into_iter()
            .filter(|def| self.achievements.achievement(&def.id).is_none())
            .collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ========================================
    // ACTIONS
    // ========================================

    /// Handle to queue actions from listeners
    pub fn action_sender(&self) -> ActionSender {
        ActionSender {
            queue: Rc::downgrade(&self.pending),
        }
    }

    /// Record a user action for today. Returns the ids earned by this call,
    /// including those earned by follow-up actions queued from listeners.
    pub fn track_action(&mut self, action: &str, metadata: &Metadata) -> Vec<String> {
        self.track_action_on(action, metadata, today())
    }

    /// [`RewardSystem::track_action`] for an explicit calendar day
    pub fn track_action_on(
        &mut self,
        action: &str,
        metadata: &Metadata,
        day: NaiveDate,
    ) -> Vec<String> {
        if !self.initialized {
            self.initialize();
        }

        self.pending.borrow_mut().push_back(QueuedAction {
            action: action.to_string(),
            metadata: metadata.clone(),
        });
        self.drain_actions(day)
    }

    fn drain_actions(&mut self, day: NaiveDate) -> Vec<String> {
        let mut earned = Vec::new();
        let mut processed = 0;

        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(queued) = next else {
                break;
            };

            if processed == MAX_CHAINED_ACTIONS {
                let dropped = self.pending.borrow().len() + 1;
                warn!("Dropping {} chained actions (limit {})", dropped, MAX_CHAINED_ACTIONS);
                self.pending.borrow_mut().clear();
                break;
            }
            processed += 1;

            earned.extend(self.process_action(&queued.action, &queued.metadata, day));
        }

        earned
    }

    fn process_action(&mut self, action: &str, metadata: &Metadata, day: NaiveDate) -> Vec<String> {
        debug!("Tracking action '{}'", action);

        // (metric, increment) pairs touched by this action
        let mut touched: Vec<(String, u64)> = Vec::new();

        if self.stats.record_activity(day).changed() {
            touched.push((STREAK_METRIC.to_string(), 1));
        }

        let increments = self.actions.lookup(action).to_vec();
        if increments.is_empty() {
            debug!("No metrics mapped to action '{}'", action);
        }
        for inc in increments {
            self.stats.bump_metric(&inc.metric, inc.amount);
            touched.push((inc.metric, inc.amount));
        }

        if !touched.is_empty() {
            self.save_statistics();
        }

        // Conditions can see the action name and every metric total
        let mut metadata = metadata.clone();
        metadata
            .entry("action")
            .or_insert_with(|| Value::from(action));
        for (metric, total) in &self.stats.metrics {
            metadata
                .entry(metric.as_str())
                .or_insert_with(|| Value::from(*total));
        }

        let mut updates: Vec<(String, i64)> = Vec::new();
        for (metric, amount) in &touched {
            let total = to_i64(self.stats.metric(metric));
            for achievement in self.achievements.achievements_for_metric(metric) {
                let value = match achievement.requirement {
                    Requirement::Counter { .. } => to_i64(*amount),
                    _ => total,
                };
                updates.push((achievement.id.clone(), value));
            }
        }
        for achievement in self.achievements.unbound() {
            updates.push((achievement.id.clone(), 1));
        }

        let mut earned = Vec::new();
        for (id, value) in updates {
            if self.achievements.is_earned(&id) {
                continue;
            }
            if self.achievements.update_progress(&id, value, &metadata) {
                earned.push(id);
            }
            self.drain_inbox();
        }
        earned
    }

    fn drain_inbox(&mut self) {
        loop {
            let next = self.inbox.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };

            self.events.emit(&event);
            if let RewardEvent::AchievementEarned { id, xp } = &event {
                self.handle_earned(id, *xp);
            }
        }
    }

    fn handle_earned(&mut self, id: &str, xp: u64) {
        self.stats.achievements_earned += 1;

        if let Some(achievement) = self.achievements.achievement(id) {
            let shown = self.notifications.show_achievement(
                &achievement.name,
                &achievement.description,
                xp,
                &achievement.icon,
            );
            if let Err(e) = shown {
                warn!("Achievement toast for '{}' rejected: {}", id, e);
            }
        }

        self.award_xp(xp, &format!("achievement:{}", id));
    }

    // ========================================
    // XP & LEVELS
    // ========================================

    /// Add `points` scaled by the active preset. Returns the XP actually added.
    pub fn award_xp(&mut self, points: u64, source: &str) -> u64 {
        let multiplier = self.multiplier();
        let scaled = if (multiplier - 1.0).abs() < f64::EPSILON {
            points
        } else {
            (points as f64 * multiplier).round() as u64
        };
        if scaled == 0 {
            debug!("Ignoring zero XP award from '{}'", source);
            return 0;
        }

        self.stats.total_xp = self.stats.total_xp.saturating_add(scaled);
        debug!("+{} XP from '{}' (total {})", scaled, source, self.stats.total_xp);
        self.save_statistics();

        self.events.emit(&RewardEvent::XpAwarded {
            points: scaled,
            source: source.to_string(),
            total_xp: self.stats.total_xp,
        });

        if self.config.xp.notify_xp {
            if let Err(e) = self.notifications.show_xp(scaled, source) {
                warn!("XP toast rejected: {}", e);
            }
        }

        if self.check_level_up().is_none() {
            self.refresh_xp_bar();
        }
        scaled
    }

    /// Recompute the level from total XP. Returns `(old, new)` on level-up.
    pub fn check_level_up(&mut self) -> Option<(u32, u32)> {
        let computed = self.levels.for_xp(self.stats.total_xp);
        if computed.level <= self.stats.level {
            return None;
        }

        let old_level = self.stats.level;
        let new_level = computed.level;
        let title = computed.title.clone();
        self.stats.level = new_level;
        info!("Level up: {} -> {} ({})", old_level, new_level, title);
        self.save_statistics();

        self.events.emit(&RewardEvent::LevelUp {
            old_level,
            new_level,
            total_xp: self.stats.total_xp,
        });
        if let Err(e) = self.notifications.show_level_up(new_level, &title) {
            warn!("Level-up toast rejected: {}", e);
        }
        self.refresh_xp_bar();

        Some((old_level, new_level))
    }

    /// Swap the level table. The current level is kept even if the new table
    /// would place the player lower.
    pub fn set_level_table(&mut self, table: LevelTable) {
        self.levels = table;
        if self.check_level_up().is_none() {
            self.refresh_xp_bar();
        }
    }

    pub fn level_table(&self) -> &LevelTable {
        &self.levels
    }

    pub fn level_progress(&self) -> LevelProgress {
        LevelProgress::new(&self.levels, self.stats.total_xp, self.stats.level)
    }

    pub fn set_preset(&mut self, name: &str) -> Result<(), ValidationError> {
        if !self.config.xp.presets.contains_key(name) {
            warn!("Unknown XP preset '{}'", name);
            return Err(ValidationError::UnknownPreset(name.to_string()));
        }
        self.config.xp.preset = name.to_string();
        info!("XP preset set to '{}' (x{})", name, self.multiplier());
        Ok(())
    }

    pub fn multiplier(&self) -> f64 {
        self.config.xp.multiplier()
    }

    // ========================================
    // XP BAR
    // ========================================

    /// Render level progress into a linear indicator in `container_id`
    pub fn attach_xp_bar(&mut self, container_id: &str) -> Result<ProgressId, ValidationError> {
        let lp = self.level_progress();
        let (current, total) = lp.bar_values();
        let config = ProgressConfig::new(ProgressKind::Linear, total)
            .current(current)
            .color("xp")
            .label("XP");

        let id = self.progress.create_progress(container_id, config)?;
        if let Some(old) = self.xp_bar.replace(id) {
            self.progress.remove_progress(old);
        }
        Ok(id)
    }

    fn refresh_xp_bar(&mut self) {
        let Some(id) = self.xp_bar else {
            return;
        };
        let lp = self.level_progress();
        let (current, total) = lp.bar_values();

        if let Err(e) = self
            .progress
            .update_progress(id, current, Some(total), UpdateOptions::default())
        {
            warn!("Detaching XP bar: {}", e);
            self.xp_bar = None;
        }
    }

    // ========================================
    // EVENTS
    // ========================================

    pub fn events(&self) -> &EventBus<RewardEvent> {
        &self.events
    }

    /// Listen to one event name (see [`crate::events`] constants)
    pub fn on<F>(&self, name: &'static str, listener: F) -> Subscription
    where
        F: Fn(&RewardEvent) + 'static,
    {
        self.events.on(name, listener)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&RewardEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn emit(&self, event: &RewardEvent) {
        self.events.emit(event);
    }

    // ========================================
    // LIFECYCLE
    // ========================================

    /// Advance timers and animations, then run actions queued outside a
    /// `track_action` call
    pub fn tick(&mut self) {
        self.notifications.tick();
        self.progress.tick();

        if !self.pending.borrow().is_empty() {
            self.drain_actions(today());
        }
    }

    /// Clear statistics and achievement progress and persist the cleared
    /// state. Toasts and indicators already on screen are left alone.
    pub fn reset(&mut self) {
        self.stats = UserStatistics {
            joined_at: Some(now_ms()),
            ..UserStatistics::default()
        };
        self.achievements.reset_progress();
        self.inbox.borrow_mut().clear();
        self.pending.borrow_mut().clear();
        self.save_statistics();
        info!("Reward progress reset");
    }

    /// Tear down timers, animations, containers and listeners. Registered
    /// achievements and their progress survive; the next
    /// [`RewardSystem::track_action`] re-initializes.
    pub fn destroy(&mut self) {
        if let Some(subscription) = self.inbox_subscription.take() {
            subscription.unsubscribe();
        }
        self.notifications.destroy();
        self.progress.destroy();
        self.events.clear();
        self.inbox.borrow_mut().clear();
        self.pending.borrow_mut().clear();
        self.xp_bar = None;
        self.initialized = false;
        debug!("Reward system destroyed");
    }

    fn save_statistics(&self) -> bool {
        let stats = self.stats.clone();
        self.slot.update(move |data| {
            data.xp = stats.total_xp;
            data.level = stats.level;
            data.statistics = stats;
        })
    }

    // ========================================
    // ACCESSORS
    // ========================================

    pub fn statistics(&self) -> &UserStatistics {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn actions_mut(&mut self) -> &mut ActionTable {
        &mut self.actions
    }

    pub fn achievements(&self) -> &AchievementController {
        &self.achievements
    }

    pub fn achievements_mut(&mut self) -> &mut AchievementController {
        &mut self.achievements
    }

    pub fn notifications(&self) -> &NotificationController {
        &self.notifications
    }

    pub fn notifications_mut(&mut self) -> &mut NotificationController {
        &mut self.notifications
    }

    pub fn progress(&self) -> &ProgressController {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressController {
        &mut self.progress
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
