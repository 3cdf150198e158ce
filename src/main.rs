use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "rewardkit")]
#[command(about = "Achievements, XP and levels for the command line")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.rewardkit/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the save file (defaults to ~/.rewardkit/progress.json)
    #[arg(short, long, global = true)]
    save: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Track actions and watch the resulting events and toasts
    Simulate {
        /// Actions to track, in order (e.g. login complete_quest)
        #[arg(required = true)]
        actions: Vec<String>,

        /// Metadata passed with every action (key=value, value parsed as JSON when possible)
        #[arg(short, long = "meta")]
        meta: Vec<String>,

        /// Keep ticking for this many seconds so toasts and animations play out
        #[arg(long, default_value_t = 0)]
        seconds: u64,
    },

    /// Show level, XP, streaks and achievement statistics
    Stats,

    /// List achievements with their progress
    Achievements {
        /// Only show earned achievements
        #[arg(long)]
        earned: bool,
    },

    /// Clear all saved progress
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let paths = cli::Paths::resolve(cli.config, cli.save);

    match cli.command {
        Commands::Init { force } => {
            cli::init::init_command(&paths, force).await?;
        }
        Commands::Simulate {
            actions,
            meta,
            seconds,
        } => {
            cli::simulate::simulate_command(&paths, &actions, &meta, seconds).await?;
        }
        Commands::Stats => {
            cli::stats::stats_command(&paths)?;
        }
        Commands::Achievements { earned } => {
            cli::achievements::achievements_command(&paths, earned)?;
        }
        Commands::Reset { force } => {
            cli::reset::reset_command(&paths, force)?;
        }
    }

    Ok(())
}
