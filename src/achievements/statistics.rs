//! Aggregate achievement statistics

use std::collections::BTreeMap;

use serde::Serialize;

use super::definitions::{Achievement, Category, Rarity};

/// Earned / total pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub earned: usize,
    pub total: usize,
}

impl Tally {
    fn add(&mut self, earned: bool) {
        self.total += 1;
        if earned {
            self.earned += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AchievementStatistics {
    pub total: usize,
    pub earned: usize,
    pub by_category: BTreeMap<Category, Tally>,
    pub by_rarity: BTreeMap<Rarity, Tally>,
    /// XP of earned achievements
    pub total_points: u64,
    /// XP of all registered achievements
    pub available_points: u64,
}

impl AchievementStatistics {
    pub(crate) fn collect<'a>(entries: impl Iterator<Item = (&'a Achievement, bool)>) -> Self {
        let mut stats = Self::default();
        for (achievement, earned) in entries {
            stats.total += 1;
            stats.available_points += achievement.xp_reward;
            if earned {
                stats.earned += 1;
                stats.total_points += achievement.xp_reward;
            }
            stats
                .by_category
                .entry(achievement.category)
                .or_default()
                .add(earned);
            stats
                .by_rarity
                .entry(achievement.rarity)
                .or_default()
                .add(earned);
        }
        stats
    }

    /// Fraction of achievements earned (0.0 - 1.0)
    pub fn completion(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.earned as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::{AchievementDef, Requirement};

    #[test]
    fn test_collect_counts_by_category_and_rarity() {
        let a = Achievement::from_def(
            AchievementDef::new("a", Requirement::counter("x", 1))
                .category(Category::Social)
                .rarity(Rarity::Rare),
            true,
        )
        .unwrap();
        let b = Achievement::from_def(
            AchievementDef::new("b", Requirement::counter("x", 1)).xp(7),
            true,
        )
        .unwrap();

        let stats = AchievementStatistics::collect([(&a, true), (&b, false)].into_iter());
        assert_eq!(stats.total, 2);
        assert_eq!(stats.earned, 1);
        assert_eq!(stats.total_points, 50);
        assert_eq!(stats.available_points, 57);
        assert_eq!(stats.by_category[&Category::Social], Tally { earned: 1, total: 1 });
        assert_eq!(stats.by_rarity[&Rarity::Common], Tally { earned: 0, total: 1 });
        assert!((stats.completion() - 0.5).abs() < f64::EPSILON);
    }
}
