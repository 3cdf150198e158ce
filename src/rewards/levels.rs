//! XP and Level system
//!
//! Defines level thresholds, titles, and progress toward the next level.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Level definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub level: u32,
    pub xp_required: u64,
    pub title: String,
}

/// Default thresholds and titles, indexed by level - 1
const STANDARD_LEVELS: &[(u64, &str)] = &[
    (0, "Newcomer"),
    (50, "Newcomer"),
    (150, "Explorer"),
    (300, "Explorer"),
    (500, "Adventurer"),
    (750, "Adventurer"),
    (1000, "Veteran"),
    (1300, "Veteran"),
    (1600, "Veteran"),
    (2000, "Expert"),
    (2500, "Expert"),
    (3000, "Expert"),
    (3500, "Master"),
    (4000, "Master"),
    (5000, "Master"),
    (6000, "Grandmaster"),
    (7000, "Grandmaster"),
    (8000, "Grandmaster"),
    (9500, "Grandmaster"),
    (11000, "Champion"),
    (13000, "Champion"),
    (15000, "Champion"),
    (17500, "Champion"),
    (20000, "Champion"),
    (23000, "Legend"),
    (26500, "Legend"),
    (30000, "Legend"),
    (35000, "Legend"),
    (40000, "Legend"),
    (50000, "Mythic"),
];

/// Level thresholds, sorted by level with non-decreasing XP
#[derive(Debug, Clone, PartialEq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// The built-in 30-level table
    pub fn standard() -> Self {
        let levels = STANDARD_LEVELS
            .iter()
            .zip(1u32..)
            .map(|(&(xp_required, title), level)| Level {
                level,
                xp_required,
                title: title.to_string(),
            })
            .collect();
        Self { levels }
    }

    /// Validate a custom table.
    ///
    /// Levels must strictly increase, thresholds must not decrease and the
    /// first threshold must be zero.
    pub fn new(levels: Vec<Level>) -> Result<Self, ValidationError> {
        let Some(first) = levels.first() else {
            return Err(ValidationError::InvalidLevelTable("table is empty".into()));
        };
        if first.xp_required != 0 {
            return Err(ValidationError::InvalidLevelTable(format!(
                "level {} must start at 0 XP",
                first.level
            )));
        }

        for pair in levels.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.level <= prev.level {
                return Err(ValidationError::InvalidLevelTable(format!(
                    "level {} follows level {}",
                    next.level, prev.level
                )));
            }
            if next.xp_required < prev.xp_required {
                return Err(ValidationError::InvalidLevelTable(format!(
                    "level {} needs less XP than level {}",
                    next.level, prev.level
                )));
            }
        }

        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Highest level whose threshold `xp` reaches
    pub fn for_xp(&self, xp: u64) -> &Level {
        self.levels
            .iter()
            .rev()
            .find(|l| xp >= l.xp_required)
            .unwrap_or(&self.levels[0])
    }

    pub fn get(&self, level: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// First level above `level` (None at max level)
    pub fn next_after(&self, level: u32) -> Option<&Level> {
        self.levels.iter().find(|l| l.level > level)
    }

    pub fn max_level(&self) -> u32 {
        self.levels.last().map(|l| l.level).unwrap_or(1)
    }
}

/// Where a player stands inside the current level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelProgress {
    pub level: u32,
    pub title: String,
    pub total_xp: u64,
    /// XP needed for current level
    pub current_level_xp: u64,
    /// XP needed for next level (None if max)
    pub next_level_xp: Option<u64>,
}

impl LevelProgress {
    /// `level` may be above what `total_xp` reaches when the table changed
    /// mid-session; levels never go down.
    pub fn new(table: &LevelTable, total_xp: u64, level: u32) -> Self {
        let entry = table
            .get(level)
            .unwrap_or_else(|| table.for_xp(total_xp));

        Self {
            level,
            title: entry.title.clone(),
            total_xp,
            current_level_xp: entry.xp_required,
            next_level_xp: table.next_after(level).map(|l| l.xp_required),
        }
    }

    /// Calculate progress percentage to next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f64 {
        let (current, span) = self.bar_values();
        (current / span).clamp(0.0, 1.0)
    }

    /// (XP earned inside this level, XP span of this level), for progress bars
    pub fn bar_values(&self) -> (f64, f64) {
        match self.next_level_xp {
            Some(next) if next > self.current_level_xp => {
                let span = next - self.current_level_xp;
                let in_level = self
                    .total_xp
                    .saturating_sub(self.current_level_xp)
                    .min(span);
                (in_level as f64, span as f64)
            }
            _ => (1.0, 1.0), // Max level
        }
    }

    pub fn xp_to_next(&self) -> Option<u64> {
        self.next_level_xp
            .map(|next| next.saturating_sub(self.total_xp))
    }

    /// Check if at max level
    pub fn is_max_level(&self) -> bool {
        self.next_level_xp.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(level: u32, xp_required: u64) -> Level {
        Level {
            level,
            xp_required,
            title: format!("L{}", level),
        }
    }

    #[test]
    fn test_level_for_xp() {
        let table = LevelTable::standard();
        assert_eq!(table.for_xp(0).level, 1);
        assert_eq!(table.for_xp(49).level, 1);
        assert_eq!(table.for_xp(50).level, 2);
        assert_eq!(table.for_xp(150).level, 3);
        assert_eq!(table.for_xp(50000).level, 30);
        assert_eq!(table.for_xp(100000).level, 30); // Beyond max
        assert_eq!(table.max_level(), 30);
    }

    #[test]
    fn test_level_progress() {
        let table = LevelTable::standard();
        let progress = LevelProgress::new(&table, 75, 2); // Between level 2 (50) and level 3 (150)
        assert!((progress.progress_to_next() - 0.25).abs() < 0.01); // 25/100 = 0.25
        assert_eq!(progress.xp_to_next(), Some(75));

        let max = LevelProgress::new(&table, 60000, 30);
        assert!(max.is_max_level());
        assert!((max.progress_to_next() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_table_validation() {
        assert!(LevelTable::new(vec![]).is_err());
        assert!(LevelTable::new(vec![level(1, 10)]).is_err());
        assert!(LevelTable::new(vec![level(1, 0), level(1, 10)]).is_err());
        assert!(LevelTable::new(vec![level(1, 0), level(2, 100), level(3, 50)]).is_err());

        let table = LevelTable::new(vec![level(1, 0), level(2, 100), level(3, 100)]).unwrap();
        assert_eq!(table.for_xp(100).level, 3);
    }

    #[test]
    fn test_progress_keeps_level_above_table() {
        let table = LevelTable::new(vec![level(1, 0), level(2, 1000)]).unwrap();
        // Level 5 is not in this table; the entry for the XP is used for the title
        let progress = LevelProgress::new(&table, 200, 5);
        assert_eq!(progress.level, 5);
        assert!(progress.is_max_level());
    }
}
