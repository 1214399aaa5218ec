#![deny(warnings)]

//! Headless CLI that plays a compressed Point Generator session against a
//! save directory and reports progression KPIs.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use idle_core::{Catalog, GameConfig, ManualClock};
use idle_runtime::{Game, GameEvent};
use persistence::FileStore;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Args {
    catalog: Option<PathBuf>,
    config: Option<PathBuf>,
    save_dir: PathBuf,
    ticks: u32,
    clicks_per_tick: u32,
    buy: bool,
    prestige: bool,
    reset: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        catalog: None,
        config: None,
        save_dir: PathBuf::from("saves"),
        ticks: 60,
        clicks_per_tick: 1,
        buy: false,
        prestige: false,
        reset: false,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--catalog" => args.catalog = it.next().map(PathBuf::from),
            "--config" => args.config = it.next().map(PathBuf::from),
            "--save-dir" => {
                if let Some(dir) = it.next() {
                    args.save_dir = PathBuf::from(dir);
                }
            }
            "--ticks" => args.ticks = it.next().and_then(|s| s.parse().ok()).unwrap_or(args.ticks),
            "--clicks-per-tick" => {
                args.clicks_per_tick = it
                    .next()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(args.clicks_per_tick)
            }
            "--buy" => args.buy = true,
            "--prestige" => args.prestige = true,
            "--reset" => args.reset = true,
            _ => {}
        }
    }
    args
}

/// Spend the balance on the cheapest affordable upgrades until none is left.
fn buy_cheapest(game: &mut Game) -> Result<u32> {
    let mut bought = 0;
    loop {
        let cheapest = game
            .affordable_upgrades()
            .into_iter()
            .min_by_key(|def| game.upgrade_cost(&def.id))
            .map(|def| def.id.clone());
        let Some(id) = cheapest else {
            return Ok(bought);
        };
        game.purchase_upgrade(&id)
            .with_context(|| format!("buying {id}"))?;
        bought += 1;
    }
}

#[derive(Default)]
struct SessionStats {
    unlocked: Vec<String>,
    offline_reward: i64,
    saves: u32,
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(
        git_sha = env!("GIT_SHA"),
        build_date = env!("BUILD_DATE"),
        ?args,
        "starting point-gen"
    );

    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin(),
    };
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            GameConfig::from_yaml_str(&text)?
        }
        None => GameConfig::default(),
    };
    let step = Duration::milliseconds((config.tick_interval_secs * 1_000.0).round() as i64);

    let clock = ManualClock::new(Utc::now());
    let mut game = Game::builder()
        .catalog(catalog)
        .config(config)
        .store(FileStore::new(&args.save_dir))
        .clock(clock.clone())
        .build()?;

    let stats = Rc::new(RefCell::new(SessionStats::default()));
    let sink = Rc::clone(&stats);
    game.subscribe(move |event| {
        let mut stats = sink.borrow_mut();
        match event {
            GameEvent::AchievementUnlocked(def) => {
                info!(id = %def.id, "achievement unlocked");
                stats.unlocked.push(def.id.to_string());
            }
            GameEvent::OfflineRewardsApplied { amount, seconds } => {
                info!(amount, away = %idle_runtime::offline::format_offline_time(*seconds), "welcome back");
                stats.offline_reward += amount;
            }
            GameEvent::SaveCompleted => stats.saves += 1,
            _ => {}
        }
    });

    if args.reset {
        game.delete_save();
    }
    game.start();

    let mut bought = 0;
    for _ in 0..args.ticks {
        for _ in 0..args.clicks_per_tick {
            game.click();
        }
        clock.advance(step);
        game.tick();
        if args.buy {
            bought += buy_cheapest(&mut game)?;
        }
    }

    let prestige_gain = if args.prestige && game.can_prestige() {
        Some(game.perform_prestige()?)
    } else {
        None
    };

    // persist against wall time so the next run measures real absence
    clock.set(Utc::now());
    game.on_quit();

    let s = game.state();
    let stats = stats.borrow();
    println!(
        "Session OK | ticks: {} | bought: {} | unlocked: [{}] | saves: {}",
        args.ticks,
        bought,
        stats.unlocked.join(", "),
        stats.saves
    );
    println!(
        "KPI | points: {} | per click: {} | per second: {} | clicks: {} | upgrades: {} | achievements: {}/{} | prestige: lvl {} ({} pts, x{:.2}){} | offline: {}",
        s.current_points,
        s.points_per_click,
        s.points_per_second,
        s.total_clicks,
        s.total_upgrades_purchased,
        game.unlocked_achievement_count(),
        game.achievement_count(),
        s.prestige.level,
        s.prestige.current_prestige_points,
        s.prestige.global_multiplier,
        prestige_gain
            .map(|g| format!(" | gained: {g}"))
            .unwrap_or_default(),
        stats.offline_reward
    );

    Ok(())
}
