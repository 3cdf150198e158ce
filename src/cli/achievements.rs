//! Achievements command implementation

use anyhow::Result;

use super::{Paths, open_system};

/// List every registered achievement with its progress
pub fn achievements_command(paths: &Paths, earned_only: bool) -> Result<()> {
    let (system, _) = open_system(paths)?;
    let controller = system.achievements();

    let mut shown = 0;
    for achievement in controller.achievements() {
        let Some(progress) = controller.progress(&achievement.id) else {
            continue;
        };
        if earned_only && !progress.earned {
            continue;
        }
        shown += 1;

        if achievement.hidden && !progress.earned {
            println!("  [ ] ??? (hidden)");
            continue;
        }

        let mark = if progress.earned { "x" } else { " " };
        println!(
            "  [{}] {} {} - {} ({}/{}, {} XP)",
            mark,
            achievement.icon,
            achievement.name,
            achievement.description,
            progress.progress,
            progress.max_progress,
            achievement.xp_reward
        );
    }

    if shown == 0 {
        println!("No achievements found.");
    }

    Ok(())
}
