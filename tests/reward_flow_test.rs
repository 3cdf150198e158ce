//! End-to-end reward flow: actions -> achievements -> XP -> levels -> toasts

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{day, harness, instant_config, weekday_noon};
use rewardkit::RewardEvent;
use rewardkit::events::{ACHIEVEMENT_EARNED, LEVEL_UP, PROGRESS_UPDATED};
use rewardkit::notifications::{NotificationState, NotificationType};
use rewardkit::surface::RenderSurface;

fn collect(h: &common::Harness, name: &'static str) -> Rc<RefCell<Vec<RewardEvent>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    h.system.on(name, move |e| sink.borrow_mut().push(e.clone()));
    seen
}

#[test]
fn test_quest_chain_earns_in_order() {
    let mut h = harness(instant_config());
    let earned = collect(&h, ACHIEVEMENT_EARNED);

    for _ in 0..10 {
        h.system.track_action_on("complete_quest", &weekday_noon(), day(4));
    }

    let ids: Vec<String> = earned
        .borrow()
        .iter()
        .filter_map(|e| match e {
            RewardEvent::AchievementEarned { id, .. } => Some(id.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec!["first-quest".to_string(), "quest-10".to_string()]);
    assert_eq!(h.system.statistics().metric("quests"), 10);
    assert_eq!(h.system.statistics().achievements_earned, 2);
}

#[test]
fn test_progress_events_report_partial_progress() {
    let mut h = harness(instant_config());
    let progress = collect(&h, PROGRESS_UPDATED);

    h.system.track_action_on("comment", &weekday_noon(), day(4));
    h.system.track_action_on("comment", &weekday_noon(), day(4));

    let commentator: Vec<u64> = progress
        .borrow()
        .iter()
        .filter_map(|e| match e {
            RewardEvent::ProgressUpdated { id, progress, .. } if id == "commentator" => {
                Some(*progress)
            }
            _ => None,
        })
        .collect();
    assert_eq!(commentator, vec![1, 2]);
}

#[test]
fn test_level_up_shows_toast() {
    let mut h = harness(instant_config());
    let levels = collect(&h, LEVEL_UP);

    h.system.award_xp(160, "import");

    assert_eq!(
        levels.borrow().as_slice(),
        &[RewardEvent::LevelUp {
            old_level: 1,
            new_level: 3,
            total_xp: 160
        }]
    );

    let stats = h.system.notifications().statistics();
    // One XP toast and one level-up toast
    assert_eq!(stats.total_shown, 2);
    assert!(
        h.surface
            .content("notifications-top-right")
            .unwrap_or_default()
            .contains("toast--level-up")
    );
}

#[test]
fn test_toasts_expire_on_tick() {
    let mut h = harness(instant_config());
    h.system.track_action_on("login", &weekday_noon(), day(4));
    assert!(h.system.notifications().statistics().visible > 0);

    h.clock.advance_ms(5_000);
    h.system.tick();
    assert_eq!(h.system.notifications().statistics().visible, 0);
}

#[test]
fn test_perfect_score_needs_both_threshold_and_condition() {
    let mut h = harness(instant_config());
    let mut perfect = weekday_noon();
    perfect.insert("score".into(), 100.into());

    // Perfect score before the fifth quest does not count
    h.system.track_action_on("complete_quest", &perfect, day(4));
    assert!(!h.system.achievements().is_earned("perfectionist"));

    for _ in 0..4 {
        h.system.track_action_on("complete_quest", &weekday_noon(), day(4));
    }
    assert!(!h.system.achievements().is_earned("perfectionist"));

    let earned = h.system.track_action_on("complete_quest", &perfect, day(4));
    assert!(earned.contains(&"perfectionist".to_string()));
}

#[test]
fn test_weekend_warrior_from_metadata() {
    let mut h = harness(instant_config());
    let mut saturday = weekday_noon();
    saturday.insert("weekday".into(), 5.into());

    let earned = h.system.track_action_on("dance", &saturday, day(9));
    assert_eq!(earned, vec!["weekend-warrior".to_string()]);

    // Achievement toast first, then the XP toast
    assert_eq!(h.system.notifications().statistics().total_shown, 2);
    h.system
        .notifications_mut()
        .clear_by_type(NotificationType::Achievement);
    assert_eq!(
        h.system.notifications().state(1),
        Some(NotificationState::Removed)
    );
}
