//! Reset command implementation

use anyhow::{Result, bail};

use super::{Paths, open_system};

/// Clear XP, statistics and achievement progress in the save file
pub fn reset_command(paths: &Paths, force: bool) -> Result<()> {
    if !force {
        bail!(
            "This clears all progress in {}\nUse --force to confirm.",
            paths.save.display()
        );
    }

    let (mut system, _) = open_system(paths)?;
    system.reset();
    println!("Progress reset: {}", paths.save.display());

    Ok(())
}
