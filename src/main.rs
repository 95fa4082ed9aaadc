use std::path::PathBuf;

use anyhow::Context;

use registro_lib::config::load_config;
use registro_lib::dashboard::build_dashboard;
use registro_lib::records::load_snapshot;
use registro_lib::types::{Activity, Note};

const USAGE: &str = "usage: registro <activities.json> [notes.json]";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let activities_path = args.next().context(USAGE)?;
    let notes_path = args.next();

    let config = load_config().map_err(|e| {
        anyhow::anyhow!("Failed to load registro config: {e}. {}", e.recovery_suggestion())
    })?;
    let clock = config.clock()?;

    let activities: Vec<Activity> = load_snapshot(&activities_path)
        .with_context(|| format!("Failed to read activities from {}", activities_path.display()))?;
    let notes: Vec<Note> = match &notes_path {
        Some(path) => load_snapshot(path)
            .with_context(|| format!("Failed to read notes from {}", path.display()))?,
        None => Vec::new(),
    };

    let dashboard = build_dashboard(&activities, &notes, &config, &clock)?;
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    Ok(())
}
