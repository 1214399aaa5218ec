#![deny(warnings)]

//! Print a summary of a save slot: `inspect [SAVE_DIR] [KEY]`.

use anyhow::{bail, Context};
use persistence::{decode, FileStore, SaveStore};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "saves".to_string());
    let key = args
        .next()
        .unwrap_or_else(|| "point_generator_save".to_string());

    let store = FileStore::new(&dir);
    let Some(blob) = store
        .read(&key)
        .with_context(|| format!("reading {key} from {dir}"))?
    else {
        bail!("no save named {key} in {dir}");
    };
    let env = decode(&blob).context("decoding save")?;
    let s = &env.state;
    let unlocked = s
        .achievement_progress
        .values()
        .filter(|p| p.unlocked)
        .count();

    println!("Save {key} | schema {} | saved {}", env.schema_version, env.save_timestamp);
    println!(
        "Points: {} | per click: {} | per second: {} | clicks: {} | upgrades bought: {}",
        s.current_points,
        s.points_per_click,
        s.points_per_second,
        s.total_clicks,
        s.total_upgrades_purchased
    );
    for (id, level) in &s.upgrade_levels {
        println!("  upgrade {id}: level {level}");
    }
    println!(
        "Achievements unlocked: {unlocked} | prestige level: {} | prestige points: {} | multiplier: {:.2}",
        s.prestige.level, s.prestige.current_prestige_points, s.prestige.global_multiplier
    );
    Ok(())
}
