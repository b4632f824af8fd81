//! Headless level dump.
//!
//! Usage: dungeon-dump [SEED] [--level N] [--config PATH] [--log LEVEL] [--modules ID,ID]
//!
//! Generates one level of a run and prints it as ASCII, followed by the room
//! layout and the pistol's stats after installing the listed modules.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::info;

use shooter_core::config::SimConfig;
use shooter_core::generation::{CorridorKind, DungeonGenerator};
use shooter_core::logging::{init_tracing, LogLevel, TracingConfig};
use shooter_core::weapons::{Weapon, WeaponKind};

#[derive(Debug, Default)]
struct Args {
    seed: Option<u64>,
    level: u32,
    config: Option<PathBuf>,
    log: Option<LogLevel>,
    modules: Vec<String>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        level: 1,
        ..Default::default()
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--level" => {
                let v = it.next().context("--level needs a value")?;
                args.level = v.parse().with_context(|| format!("bad level {v:?}"))?;
                if args.level == 0 {
                    bail!("levels start at 1");
                }
            }
            "--config" => {
                args.config = Some(it.next().context("--config needs a path")?.into());
            }
            "--log" => {
                let v = it.next().context("--log needs a level")?;
                args.log = Some(v.parse()?);
            }
            "--modules" => {
                let v = it.next().context("--modules needs a list")?;
                args.modules = v.split(',').map(|s| s.trim().to_string()).collect();
            }
            other if args.seed.is_none() => {
                args.seed = Some(other.parse().with_context(|| format!("bad seed {other:?}"))?);
            }
            other => bail!("unexpected argument {other:?}"),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    let args = parse_args()?;
    init_tracing(&TracingConfig::with_level(args.log.unwrap_or(LogLevel::Warn)));

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed.seed = seed;
    }
    config.validate()?;

    let level_seed = config.seed.level_hash(args.level);
    info!(run_seed = config.seed.seed, level = args.level, level_seed, "generating");

    let generator = DungeonGenerator::new(config.generation.clone());
    let dungeon = generator.generate(
        config.session.map_width,
        config.session.map_height,
        level_seed,
    )?;

    println!("{}", dungeon.grid.to_ascii());
    println!(
        "run seed {} level {} -> {} rooms ({} requested), {} corridors ({} extra)",
        config.seed.seed,
        args.level,
        dungeon.rooms.len(),
        dungeon.requested_rooms,
        dungeon.corridors.len(),
        dungeon
            .corridors
            .iter()
            .filter(|c| c.kind == CorridorKind::Extra)
            .count(),
    );
    println!(
        "connected: {}  loops: {}  start: ({:.0}, {:.0})",
        dungeon.is_fully_connected(),
        dungeon.has_loops(),
        dungeon.start_position.x,
        dungeon.start_position.y,
    );
    for (i, room) in dungeon.rooms.iter().enumerate() {
        println!(
            "  room {i:>2}: {}x{} at ({}, {})",
            room.width, room.height, room.x, room.y
        );
    }

    let mut pistol = Weapon::from_kind(WeaponKind::Pistol);
    for id in &args.modules {
        pistol
            .apply_preset(id)
            .with_context(|| format!("installing module {id:?}"))?;
    }
    let stats = &pistol.effective().stats;
    println!(
        "{}: damage {:.1} interval {:.0}ms speed {:.0} range {:.0} projectiles {} piercing {}",
        pistol.effective().name,
        stats.damage,
        stats.fire_interval,
        stats.projectile_speed,
        stats.range,
        pistol.effective().projectile_count(),
        stats.piercing,
    );
    Ok(())
}
