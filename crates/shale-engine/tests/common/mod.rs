//! Shared fixtures: ASCII maps and a fully equipped actor.
#![allow(dead_code)]

use glam::Vec2;
use shale_ecs::prelude::{EntityId, Store};
use shale_engine::prelude::*;
use shale_level::level::{Camera, Level};
use shale_level::tilemap::{AutotileKind, TileDef, Tilemap, Tileset};

pub const TILE: i32 = 48;

/// Build a level from an ASCII map: `#` solid, anything else empty.
pub fn level_from_ascii(rows: &[&str], systems: &[&str]) -> Level {
    let height = rows.len() as i32;
    let width = rows[0].len() as i32;
    let grid = rows
        .iter()
        .map(|row| {
            assert_eq!(row.len() as i32, width, "ragged ascii map");
            row.chars().map(|c| if c == '#' { 0 } else { -1 }).collect()
        })
        .collect();
    let tileset = Tileset {
        name: "test".into(),
        tile_size: TILE,
        tiles: vec![TileDef::new(true, AutotileKind::Unique, 1, 0.333)],
    };
    let tilemap = Tilemap::new(
        "test".into(),
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
        192,
        192,
    );
    Level {
        name: "test".into(),
        tilemap,
        camera,
        player: None,
        systems: systems.iter().map(|s| s.to_string()).collect(),
        entities: Vec::new(),
    }
}

/// An engine with every built-in system and all components registered.
pub fn engine() -> Engine {
    let mut store = Store::new();
    register_components(&mut store);
    Engine::with_builtin_systems(store, 1.0 / 60.0, 7)
}

/// Spawn an actor with the full platforming component set, at rest,
/// centered on `(x, y)` with a 40x40 hitbox.
pub fn spawn_actor(store: &mut Store, x: f32, y: f32) -> EntityId {
    let entity = store.spawn();
    store.insert(entity, Position { x, y }).unwrap();
    store.insert(entity, NextPosition { x, y }).unwrap();
    store.insert(entity, Velocity::default()).unwrap();
    store.insert(entity, Mass::default()).unwrap();
    store.insert(entity, XDirection::default()).unwrap();
    store
        .insert(entity, Hitbox { x, y, width: 40, height: 40 })
        .unwrap();
    store.insert(entity, State::default()).unwrap();
    store.insert(entity, Properties::default()).unwrap();
    store.insert(entity, Jump::default()).unwrap();
    store.insert(entity, WallSticking::default()).unwrap();
    store.insert(entity, Walk::default()).unwrap();
    store.insert(entity, MapCollision::default()).unwrap();
    store.insert(entity, EntityCollision::default()).unwrap();
    entity
}

pub fn state_of(store: &Store, entity: EntityId) -> State {
    store.get::<State>(entity).copied().unwrap()
}

pub fn rect_of(store: &Store, entity: EntityId) -> shale_level::geom::Rect {
    store.get::<Hitbox>(entity).unwrap().rect()
}
