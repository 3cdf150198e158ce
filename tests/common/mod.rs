//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::rc::Rc;

use chrono::NaiveDate;
use serde_json::json;

use rewardkit::achievements::Metadata;
use rewardkit::clock::ManualClock;
use rewardkit::storage::MemoryStore;
use rewardkit::surface::MemorySurface;
use rewardkit::{Config, RewardSystem, Services};

pub struct Harness {
    pub clock: Rc<ManualClock>,
    pub surface: Rc<MemorySurface>,
    pub store: Rc<MemoryStore>,
    pub system: RewardSystem,
}

/// Initialized system on a manual clock, in-memory surface and store
pub fn harness(config: Config) -> Harness {
    harness_with_store(config, Rc::new(MemoryStore::new()))
}

pub fn harness_with_store(config: Config, store: Rc<MemoryStore>) -> Harness {
    let clock = Rc::new(ManualClock::new());
    let surface = Rc::new(MemorySurface::new());
    let services = Services::new(store.clone(), surface.clone()).clock(clock.clone());

    let mut system = RewardSystem::new(config, services);
    system.initialize();

    Harness {
        clock,
        surface,
        store,
        system,
    }
}

/// Config with animations off so state changes are immediate
pub fn instant_config() -> Config {
    let mut config = Config::default();
    config.notifications.enable_animations = false;
    config.progress.enable_animations = false;
    config
}

/// Metadata that keeps clock-based predicates (weekend, night) false
pub fn weekday_noon() -> Metadata {
    json!({"weekday": 2, "hour": 12})
        .as_object()
        .cloned()
        .unwrap_or_default()
}

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, d).expect("valid test date")
}
