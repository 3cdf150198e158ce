//! CLI command implementations

pub mod achievements;
pub mod init;
pub mod reset;
pub mod simulate;
pub mod stats;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;

use rewardkit::storage::JsonFileStore;
use rewardkit::surface::MemorySurface;
use rewardkit::{Config, RewardSystem, Services};

/// Config and save file locations for one invocation
pub struct Paths {
    pub config: PathBuf,
    pub save: PathBuf,
}

impl Paths {
    pub fn resolve(config: Option<PathBuf>, save: Option<PathBuf>) -> Self {
        Self {
            config: config.unwrap_or_else(Config::global_config_path),
            save: save.unwrap_or_else(JsonFileStore::default_path),
        }
    }
}

/// Build an initialized system backed by the save file.
///
/// Rendering goes to an in-memory surface; commands read it back when they
/// want to show markup.
pub fn open_system(paths: &Paths) -> Result<(RewardSystem, Rc<MemorySurface>)> {
    let config = Config::load_or_default(&paths.config)?;
    let surface = Rc::new(MemorySurface::new());
    let store = Rc::new(JsonFileStore::new(&paths.save));

    let mut system = RewardSystem::new(config, Services::new(store, surface.clone()));
    system.initialize();
    Ok((system, surface))
}
