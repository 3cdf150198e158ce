//! Instance-scoped publish/subscribe
//!
//! Every controller owns an [`EventBus`] for its own event type. Listeners are
//! plain closures; [`EventBus::subscribe`] and [`EventBus::on`] hand back a
//! [`Subscription`] that removes the listener again.
//!
//! Dispatch works on a snapshot of the listener list, so a listener may
//! subscribe, unsubscribe or emit on the same bus without a borrow conflict.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

/// Events carry a stable wire name used for name-filtered listeners
pub trait NamedEvent {
    fn name(&self) -> &'static str;
}

pub const ACHIEVEMENT_EARNED: &str = "achievement-earned";
pub const PROGRESS_UPDATED: &str = "progress-updated";
pub const LEVEL_UP: &str = "level-up";
pub const XP_AWARDED: &str = "xp-awarded";

/// Events emitted by the achievement controller and the reward system
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum RewardEvent {
    AchievementEarned {
        id: String,
        xp: u64,
    },
    #[serde(rename_all = "camelCase")]
    ProgressUpdated {
        id: String,
        progress: u64,
        max_progress: u64,
    },
    #[serde(rename_all = "camelCase")]
    LevelUp {
        old_level: u32,
        new_level: u32,
        #[serde(rename = "totalXP")]
        total_xp: u64,
    },
    #[serde(rename_all = "camelCase")]
    XpAwarded {
        points: u64,
        source: String,
        #[serde(rename = "totalXP")]
        total_xp: u64,
    },
}

impl NamedEvent for RewardEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::AchievementEarned { .. } => ACHIEVEMENT_EARNED,
            Self::ProgressUpdated { .. } => PROGRESS_UPDATED,
            Self::LevelUp { .. } => LEVEL_UP,
            Self::XpAwarded { .. } => XP_AWARDED,
        }
    }
}

type Listener<E> = Rc<dyn Fn(&E)>;

struct BusInner<E> {
    next_id: u64,
    listeners: Vec<(u64, Option<&'static str>, Listener<E>)>,
}

/// Single-threaded observer list
pub struct EventBus<E> {
    inner: Rc<RefCell<BusInner<E>>>,
}

impl<E> Clone for EventBus<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: NamedEvent + 'static> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: NamedEvent + 'static> EventBus<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                next_id: 1,
                listeners: Vec::new(),
            })),
        }
    }

    /// Listen to every event on this bus
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        self.add(None, Rc::new(listener))
    }

    /// Listen to events whose [`NamedEvent::name`] equals `name`
    pub fn on<F>(&self, name: &'static str, listener: F) -> Subscription
    where
        F: Fn(&E) + 'static,
    {
        self.add(Some(name), Rc::new(listener))
    }

    fn add(&self, filter: Option<&'static str>, listener: Listener<E>) -> Subscription {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.push((id, filter, listener));
            id
        };

        let weak: Weak<RefCell<BusInner<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().listeners.retain(|(lid, _, _)| *lid != id);
                }
            })),
        }
    }

    /// Deliver `event` to every matching listener, in subscription order
    pub fn emit(&self, event: &E) {
        let name = event.name();
        let snapshot: Vec<Listener<E>> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, filter, _)| filter.is_none_or(|f| f == name))
            .map(|(_, _, l)| Rc::clone(l))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    /// Drop all listeners
    pub fn clear(&self) {
        self.inner.borrow_mut().listeners.clear();
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }
}

/// Handle returned by [`EventBus::subscribe`] / [`EventBus::on`]
///
/// Dropping the handle keeps the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    enum Ping {
        A,
        B,
    }

    impl NamedEvent for Ping {
        fn name(&self) -> &'static str {
            match self {
                Ping::A => "a",
                Ping::B => "b",
            }
        }
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let bus: EventBus<Ping> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let sub = bus.subscribe(move |_| h.set(h.get() + 1));
        bus.emit(&Ping::A);
        bus.emit(&Ping::B);
        assert_eq!(hits.get(), 2);

        sub.unsubscribe();
        bus.emit(&Ping::A);
        assert_eq!(hits.get(), 2);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_on_filters_by_name() {
        let bus: EventBus<Ping> = EventBus::new();
        let hits = Rc::new(Cell::new(0));

        let h = Rc::clone(&hits);
        let _sub = bus.on("b", move |_| h.set(h.get() + 1));
        bus.emit(&Ping::A);
        bus.emit(&Ping::B);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_during_emit() {
        let bus: EventBus<Ping> = EventBus::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let hits = Rc::new(Cell::new(0));

        let s = Rc::clone(&slot);
        let h = Rc::clone(&hits);
        let sub = bus.subscribe(move |_| {
            h.set(h.get() + 1);
            if let Some(sub) = s.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        *slot.borrow_mut() = Some(sub);

        bus.emit(&Ping::A);
        bus.emit(&Ping::A);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_reward_event_wire_shape() {
        let event = RewardEvent::LevelUp {
            old_level: 1,
            new_level: 2,
            total_xp: 60,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "level-up");
        assert_eq!(json["oldLevel"], 1);
        assert_eq!(json["totalXP"], 60);
        assert_eq!(event.name(), LEVEL_UP);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus: EventBus<Ping> = EventBus::new();
        let sub = bus.subscribe(|_| {});
        drop(bus);
        sub.unsubscribe();
    }
}
