//! Simulate command implementation

use std::time::Duration;

use anyhow::{Result, bail};
use serde_json::Value;
use tokio::time::{Instant, interval};

use rewardkit::achievements::Metadata;
use rewardkit::notifications::Position;
use rewardkit::surface::RenderSurface;

use super::{Paths, open_system};

/// Animation/timer tick rate while simulating
const TICK: Duration = Duration::from_millis(16);

/// Parse `key=value` pairs; values are JSON when they parse as JSON
pub fn parse_metadata(pairs: &[String]) -> Result<Metadata> {
    let mut metadata = Metadata::new();
    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            bail!("Invalid metadata '{}', expected key=value", pair);
        };
        let key = key.trim();
        if key.is_empty() {
            bail!("Invalid metadata '{}', key is empty", pair);
        }
        let value = serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::from(raw));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}

/// Track `actions` against the save file and print what happens
pub async fn simulate_command(
    paths: &Paths,
    actions: &[String],
    meta: &[String],
    seconds: u64,
) -> Result<()> {
    let metadata = parse_metadata(meta)?;
    let (mut system, surface) = open_system(paths)?;

    let _printer = system.subscribe(|event| match serde_json::to_string(event) {
        Ok(line) => println!("  {}", line),
        Err(e) => eprintln!("  <unprintable event: {}>", e),
    });

    for action in actions {
        println!("> {}", action);
        let earned = system.track_action(action, &metadata);
        if !earned.is_empty() {
            println!("  earned: {}", earned.join(", "));
        }
    }

    if seconds > 0 {
        let deadline = Instant::now() + Duration::from_secs(seconds);
        let mut ticker = interval(TICK);
        while Instant::now() < deadline {
            ticker.tick().await;
            system.tick();
        }
    }

    let toasts = system.notifications().statistics();
    println!(
        "\nToasts: {} visible, {} queued, {} shown in total",
        toasts.visible, toasts.queued, toasts.total_shown
    );
    for position in Position::ALL {
        if let Some(markup) = surface.content(&position.container_id()) {
            if !markup.is_empty() {
                println!("  [{}] {}", position.as_str(), markup);
            }
        }
    }

    let stats = system.statistics();
    let level = system.level_progress();
    println!(
        "Level {} ({}) · {} XP · streak {} day(s)",
        level.level, level.title, stats.total_xp, stats.current_streak
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata() {
        let meta = parse_metadata(&[
            "score=100".to_string(),
            "avatar=me.png".to_string(),
            "flags=[1,2]".to_string(),
        ])
        .unwrap();
        assert_eq!(meta["score"], json!(100));
        assert_eq!(meta["avatar"], json!("me.png"));
        assert_eq!(meta["flags"], json!([1, 2]));

        assert!(parse_metadata(&["novalue".to_string()]).is_err());
        assert!(parse_metadata(&["=x".to_string()]).is_err());
    }
}
