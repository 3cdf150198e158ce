//! Animation scheduler
//!
//! Holds at most one transition per indicator and advances all of them on an
//! external tick. Scheduling a transition for an indicator that is already
//! animating replaces it (coalescing): the new transition starts from the
//! value currently on screen and heads for the newest target.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Values closer than this to the target are considered settled
pub const SETTLE_TOLERANCE: f64 = 1e-6;

/// Interpolation curve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    EaseOut,
    EaseInOut,
}

impl Easing {
    /// Map linear time `t` (0.0 - 1.0) onto the curve
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: f64,
    to: f64,
    started: Duration,
}

/// One indicator's value for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub id: u64,
    pub value: f64,
    /// Transition reached its target and left the active set
    pub settled: bool,
}

#[derive(Debug, Clone)]
pub struct AnimationScheduler {
    duration: Duration,
    easing: Easing,
    active: BTreeMap<u64, Transition>,
}

impl AnimationScheduler {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self {
            duration,
            easing,
            active: BTreeMap::new(),
        }
    }

    /// Start (or retarget) the transition of `id`
    pub fn schedule(&mut self, id: u64, from: f64, to: f64, now: Duration) {
        if (to - from).abs() <= SETTLE_TOLERANCE {
            self.active.remove(&id);
            return;
        }
        self.active.insert(
            id,
            Transition {
                from,
                to,
                started: now,
            },
        );
    }

    pub fn cancel(&mut self, id: u64) {
        self.active.remove(&id);
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }

    pub fn is_active(&self, id: u64) -> bool {
        self.active.contains_key(&id)
    }

    pub fn target(&self, id: u64) -> Option<f64> {
        self.active.get(&id).map(|t| t.to)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Advance every active transition to `now`
    pub fn advance(&mut self, now: Duration) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(self.active.len());

        for (&id, transition) in &self.active {
            let elapsed = now.saturating_sub(transition.started);
            let t = if self.duration.is_zero() {
                1.0
            } else {
                elapsed.as_secs_f64() / self.duration.as_secs_f64()
            };

            let eased = self.easing.apply(t);
            let mut value = transition.from + (transition.to - transition.from) * eased;
            let settled = t >= 1.0 || (transition.to - value).abs() <= SETTLE_TOLERANCE;
            if settled {
                value = transition.to;
            }

            frames.push(Frame { id, value, settled });
        }

        for frame in frames.iter().filter(|f| f.settled) {
            self.active.remove(&frame.id);
        }

        frames
    }
}
