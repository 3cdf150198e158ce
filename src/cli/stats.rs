//! Stats command implementation

use anyhow::Result;

use super::{Paths, open_system};

/// Print level, XP, streaks and achievement statistics
pub fn stats_command(paths: &Paths) -> Result<()> {
    let (system, _) = open_system(paths)?;
    let stats = system.statistics();
    let level = system.level_progress();

    println!("Level {} - {}", level.level, level.title);
    match level.xp_to_next() {
        Some(left) => println!(
            "XP: {} ({:.0}% to next level, {} to go)",
            stats.total_xp,
            level.progress_to_next() * 100.0,
            left
        ),
        None => println!("XP: {} (max level)", stats.total_xp),
    }
    println!(
        "Streak: {} day(s), best {} day(s)",
        stats.current_streak, stats.max_streak
    );

    let achievements = system.achievements().statistics();
    println!(
        "\nAchievements: {}/{} ({:.0}%), {}/{} points",
        achievements.earned,
        achievements.total,
        achievements.completion() * 100.0,
        achievements.total_points,
        achievements.available_points
    );
    for (category, tally) in &achievements.by_category {
        println!("  {:<12} {}/{}", category.label(), tally.earned, tally.total);
    }

    if !stats.metrics.is_empty() {
        println!("\nMetrics:");
        for (metric, total) in &stats.metrics {
            println!("  {:<16} {}", metric, total);
        }
    }

    Ok(())
}
