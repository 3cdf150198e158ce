//! Achievement Controller - definitions, per-user progress and earn evaluation
//!
//! Owns every [`Achievement`] and its progress record. Progress only moves
//! forward and is clamped to `[0, max_progress]`; an earned achievement is
//! frozen and further updates are no-ops.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::conditions::{Metadata, PredicateRegistry};
use super::definitions::{Achievement, AchievementDef, Requirement};
use super::statistics::AchievementStatistics;
use crate::clock::now_ms;
use crate::config::AchievementSettings;
use crate::error::ValidationError;
use crate::events::{EventBus, RewardEvent};
use crate::storage::{AchievementRecord, SaveSlot};

/// Read-only view of one achievement's progress
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub id: String,
    pub progress: u64,
    pub max_progress: u64,
    pub earned: bool,
    pub earned_at: Option<i64>,
}

impl ProgressView {
    /// Completion ratio (0.0 - 1.0)
    pub fn ratio(&self) -> f64 {
        if self.max_progress == 0 {
            return 1.0;
        }
        (self.progress as f64 / self.max_progress as f64).min(1.0)
    }
}

pub struct AchievementController {
    settings: AchievementSettings,
    slot: SaveSlot,
    predicates: PredicateRegistry,
    /// Registration order
    order: Vec<String>,
    achievements: HashMap<String, Achievement>,
    records: HashMap<String, AchievementRecord>,
    /// Loaded records whose achievement has not been registered (yet)
    stored: HashMap<String, AchievementRecord>,
    events: EventBus<RewardEvent>,
}

impl AchievementController {
    /// Create a controller and load persisted progress from `slot`
    pub fn new(settings: AchievementSettings, slot: SaveSlot, predicates: PredicateRegistry) -> Self {
        let stored = slot
            .load()
            .achievements
            .into_iter()
            .map(|r| (r.id.clone(), r))
            .collect::<HashMap<_, _>>();
        debug!("Loaded progress for {} achievements", stored.len());

        Self {
            settings,
            slot,
            predicates,
            order: Vec::new(),
            achievements: HashMap::new(),
            records: HashMap::new(),
            stored,
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus<RewardEvent> {
        &self.events
    }

    pub fn predicates_mut(&mut self) -> &mut PredicateRegistry {
        &mut self.predicates
    }

    // ========================================
    // REGISTRATION
    // ========================================

    /// Validate and store a definition, restoring any persisted progress
    pub fn register_achievement(&mut self, def: AchievementDef) -> Result<(), ValidationError> {
        let achievement = match Achievement::from_def(def, self.settings.validate_data) {
            Ok(a) => a,
            Err(e) => {
                warn!("Rejected achievement definition: {}", e);
                return Err(e);
            }
        };

        if self.achievements.contains_key(&achievement.id) {
            let err = ValidationError::DuplicateId(achievement.id);
            warn!("Rejected achievement definition: {}", err);
            return Err(err);
        }

        let record = match self.stored.remove(&achievement.id) {
            Some(mut saved) => {
                saved.progress = saved.progress.min(achievement.max_progress);
                if saved.earned && saved.earned_at.is_none() {
                    saved.earned_at = Some(now_ms());
                }
                saved
            }
            None => AchievementRecord {
                id: achievement.id.clone(),
                progress: 0,
                earned: false,
                earned_at: None,
            },
        };

        debug!("Registered achievement '{}'", achievement.id);
        self.order.push(achievement.id.clone());
        self.records.insert(achievement.id.clone(), record);
        self.achievements.insert(achievement.id.clone(), achievement);
        Ok(())
    }

    /// Register many definitions, returning how many were accepted
    pub fn register_all(&mut self, defs: impl IntoIterator<Item = AchievementDef>) -> usize {
        defs.into_iter()
            .filter_map(|def| self.register_achievement(def).ok())
            .count()
    }

    // ========================================
    // PROGRESS
    // ========================================

    /// Feed a metric value into an achievement.
    ///
    /// Counter requirements treat `value` as an increment; threshold and
    /// condition requirements treat it as the current metric total.
    /// Returns `true` only on the call that earns the achievement.
    pub fn update_progress(&mut self, id: &str, value: i64, metadata: &Metadata) -> bool {
        let Some(achievement) = self.achievements.get(id) else {
            warn!("Progress update for unknown achievement '{}'", id);
            return false;
        };
        let Some(record) = self.records.get(id) else {
            return false;
        };
        if record.earned {
            return false;
        }

        let max = achievement.max_progress;
        let old = record.progress;
        let reported = match &achievement.requirement {
            Requirement::Counter { .. } => old.saturating_add_signed(value),
            Requirement::Threshold { .. } | Requirement::Conditions { threshold: Some(_), .. } => {
                u64::try_from(value).unwrap_or(0)
            }
            Requirement::Conditions { threshold: None, .. } => old,
        };
        let new = reported.min(max).max(old);

        if self.is_achievement_earned(achievement, new, metadata) {
            let xp = achievement.xp_reward;
            let earned_at = now_ms();
            if let Some(record) = self.records.get_mut(id) {
                record.progress = max;
                record.earned = true;
                record.earned_at = Some(earned_at);
            }
            info!("Achievement earned: '{}' (+{} XP)", id, xp);
            self.persist();
            self.events.emit(&RewardEvent::AchievementEarned {
                id: id.to_string(),
                xp,
            });
            return true;
        }

        if new != old {
            if let Some(record) = self.records.get_mut(id) {
                record.progress = new;
            }
            if self.settings.track_progress {
                self.persist();
                self.events.emit(&RewardEvent::ProgressUpdated {
                    id: id.to_string(),
                    progress: new,
                    max_progress: max,
                });
            }
        }

        false
    }

    /// Earn rule: progress threshold reached AND, for condition trees, the tree holds
    pub fn is_achievement_earned(
        &self,
        achievement: &Achievement,
        progress: u64,
        metadata: &Metadata,
    ) -> bool {
        match &achievement.requirement {
            Requirement::Threshold { .. } | Requirement::Counter { .. } => {
                progress >= achievement.max_progress
            }
            Requirement::Conditions {
                threshold,
                conditions,
                ..
            } => {
                let threshold_met = threshold.is_none_or(|t| progress >= t);
                threshold_met && self.predicates.evaluate(conditions, metadata)
            }
        }
    }

    // ========================================
    // QUERIES
    // ========================================

    pub fn achievement(&self, id: &str) -> Option<&Achievement> {
        self.achievements.get(id)
    }

    /// Achievements in registration order
    pub fn achievements(&self) -> impl Iterator<Item = &Achievement> {
        self.order.iter().filter_map(|id| self.achievements.get(id))
    }

    /// Achievements whose requirement listens to `metric`
    pub fn achievements_for_metric(&self, metric: &str) -> Vec<&Achievement> {
        self.achievements()
            .filter(|a| a.requirement.metric() == Some(metric))
            .collect()
    }

    /// Condition achievements without a metric; evaluated on every action
    pub fn unbound(&self) -> Vec<&Achievement> {
        self.achievements()
            .filter(|a| a.requirement.metric().is_none())
            .collect()
    }

    pub fn is_earned(&self, id: &str) -> bool {
        self.records.get(id).is_some_and(|r| r.earned)
    }

    pub fn progress(&self, id: &str) -> Option<ProgressView> {
        let achievement = self.achievements.get(id)?;
        let record = self.records.get(id)?;
        Some(ProgressView {
            id: id.to_string(),
            progress: record.progress,
            max_progress: achievement.max_progress,
            earned: record.earned,
            earned_at: record.earned_at,
        })
    }

    pub fn all_progress(&self) -> Vec<ProgressView> {
        self.order.iter().filter_map(|id| self.progress(id)).collect()
    }

    pub fn statistics(&self) -> AchievementStatistics {
        AchievementStatistics::collect(
            self.achievements()
                .filter_map(|a| self.records.get(&a.id).map(|r| (a, r.earned))),
        )
    }

    // ========================================
    // PERSISTENCE
    // ========================================

    fn persist(&self) {
        if self.settings.auto_save {
            self.save();
        }
    }

    /// Write all records, keeping loaded records of unregistered achievements
    pub fn save(&self) -> bool {
        let mut records: Vec<AchievementRecord> = self
            .order
            .iter()
            .filter_map(|id| self.records.get(id).cloned())
            .collect();
        let mut orphans: Vec<AchievementRecord> = self.stored.values().cloned().collect();
        orphans.sort_by(|a, b| a.id.cmp(&b.id));
        records.extend(orphans);

        self.slot.update(|data| data.achievements = records)
    }

    /// Clear every progress record and persist the cleared state
    pub fn reset_progress(&mut self) {
        for record in self.records.values_mut() {
            record.progress = 0;
            record.earned = false;
            record.earned_at = None;
        }
        self.stored.clear();
        info!("Achievement progress reset");
        self.save();
    }
}
