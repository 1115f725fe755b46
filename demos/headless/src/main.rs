//! Headless simulation runner.
//!
//! Runs the platformer core without a renderer: either a level loaded from
//! an asset directory (`shale-headless <assets-root> [level]`) or, with no
//! arguments, a built-in arena with one controlled actor. The actor walks
//! right and hops periodically for ten simulated seconds while the run is
//! traced at one-second intervals. `RUST_LOG` controls verbosity.

use anyhow::Context;
use glam::Vec2;
use shale_ecs::prelude::Store;
use shale_engine::prelude::*;
use shale_level::assets::AssetCache;
use shale_level::level::{Camera, Level};
use shale_level::tilemap::{AutotileKind, TileDef, Tilemap, Tileset};
use tracing_subscriber::EnvFilter;

const TILE: i32 = 48;
const SECONDS: u64 = 10;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut store = Store::new();
    register_components(&mut store);

    let mut args = std::env::args().skip(1);
    let (mut level, actor) = match args.next() {
        Some(root) => {
            let name = args.next().unwrap_or_else(|| "intro".to_owned());
            let mut cache = AssetCache::new(&root);
            let level = cache
                .load_level(&name, &mut store, &SYSTEM_PRIORITY)
                .with_context(|| format!("loading level {name:?} from {root:?}"))?;
            let actor = level
                .player
                .context("level has no player to drive")?;
            (level, actor)
        }
        None => builtin_arena(&mut store)?,
    };

    let mut engine = Engine::with_builtin_systems(store, 1.0 / 60.0, 0xC0FFEE);
    let mut clock = FrameClock::new(engine.fixed_dt());

    while engine.sim_time() < SECONDS as f64 {
        // Pretend the host renders at a steady 60 fps.
        for _ in 0..clock.advance(1.0 / 60.0) {
            let second = engine.sim_time() as u64;
            engine.set_input(InputSnapshot {
                move_right: true,
                // Hop at the top of each even second.
                jump_pressed: second % 2 == 0 && engine.tick_count() % 60 == 0,
                ..Default::default()
            });
            engine.tick(&mut level);
        }

        if engine.tick_count() % 60 == 0 {
            let pos = engine
                .store
                .get::<Position>(actor)
                .copied()
                .unwrap_or_default();
            let state = engine
                .store
                .get::<State>(actor)
                .copied()
                .unwrap_or_default();
            tracing::info!(
                t = engine.sim_time(),
                x = pos.x,
                y = pos.y,
                state = ?state.flags,
                camera = ?level.camera.pos,
                "tick"
            );
        }
    }

    tracing::info!(ticks = engine.tick_count(), "run complete");
    Ok(())
}

/// A sealed 24x10 box with a floor, one wall, and a fully equipped actor.
fn builtin_arena(store: &mut Store) -> anyhow::Result<(Level, shale_ecs::prelude::EntityId)> {
    let width = 24;
    let height = 10;
    let mut grid = vec![vec![-1; width as usize]; height as usize];
    for x in 0..width as usize {
        grid[0][x] = 0;
        grid[height as usize - 2][x] = 0;
        grid[height as usize - 1][x] = 0;
    }
    for row in grid.iter_mut() {
        row[0] = 0;
        row[width as usize - 1] = 0;
    }

    let tileset = Tileset {
        name: "builtin".into(),
        tile_size: TILE,
        tiles: vec![TileDef::new(true, AutotileKind::Unique, 1, 0.333)],
    };
    let tilemap = Tilemap::new(
        "builtin".into(),
        width,
        height,
        tileset,
        String::new(),
        String::new(),
        grid,
    );
    let camera = Camera::new(
        Vec2::new(
            tilemap.pixel_width() as f32 / 2.0,
            tilemap.pixel_height() as f32 / 2.0,
        ),
        640,
        360,
    );

    let (x, y) = (120.0, 300.0);
    let actor = store.spawn();
    store.insert(actor, Position { x, y })?;
    store.insert(actor, NextPosition { x, y })?;
    store.insert(actor, Velocity::default())?;
    store.insert(actor, Mass::default())?;
    store.insert(actor, XDirection::default())?;
    store.insert(actor, Hitbox { x, y, width: 40, height: 40 })?;
    store.insert(actor, State::default())?;
    store.insert(actor, Properties::default())?;
    store.insert(actor, Jump { strength: 6.0e3, ..Default::default() })?;
    store.insert(actor, WallSticking::default())?;
    store.insert(actor, Walk::default())?;
    store.insert(actor, MapCollision::default())?;
    store.insert(actor, EntityCollision::default())?;
    store.insert(actor, Controlled {})?;
    store.insert(actor, CameraFollow { deadzone: [160, 120], ..Default::default() })?;

    let level = Level {
        name: "builtin".into(),
        tilemap,
        camera,
        player: Some(actor),
        systems: SYSTEM_PRIORITY.iter().map(|s| s.to_string()).collect(),
        entities: vec![actor],
    };
    Ok((level, actor))
}
