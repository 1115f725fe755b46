//! JSON asset documents and the loader cache.
//!
//! Four document kinds feed the simulation: tilesets, tilemaps, entity
//! blueprints, and levels. Field names are part of the on-disk format and
//! round-trip losslessly. Malformed documents, unknown component kinds and
//! out-of-range tile indices abort the load with a diagnostic; load errors
//! are never surfaced as simulation faults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use shale_ecs::prelude::{EntityId, Store};

use crate::level::{Camera, Level};
use crate::tilemap::{AutotileKind, TileDef, Tilemap, Tileset};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while loading assets. All are fatal to the load.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed document {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("tilemap '{tilemap}' grid does not match its declared size {width}x{height}")]
    GridShape {
        tilemap: String,
        width: i32,
        height: i32,
    },

    #[error(
        "tilemap '{tilemap}' cell ({x}, {y}) references tile {index} but tileset '{tileset}' only has {tile_count} tiles"
    )]
    InvalidTileIndex {
        tilemap: String,
        tileset: String,
        x: i32,
        y: i32,
        index: i32,
        tile_count: usize,
    },

    /// A blueprint referenced a component kind the store does not know, or
    /// its overrides did not match the component schema.
    #[error(transparent)]
    Component(#[from] shale_ecs::EcsError),
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

fn default_tile_size() -> i32 {
    48
}

fn default_animation_delay() -> f32 {
    0.333
}

fn default_camera_dim() -> i32 {
    1920
}

fn default_camera_height() -> i32 {
    1080
}

/// One tile entry of a tileset document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileDoc {
    /// Graphics file this tile is cut from.
    pub file: String,
    /// Frame origins in the graphics file, in tile units.
    pub frames: Vec<[i32; 2]>,
    #[serde(rename = "type", default)]
    pub kind: AutotileKind,
    /// Nonzero marks the tile solid.
    #[serde(default)]
    pub hitbox: u8,
    #[serde(default = "default_animation_delay")]
    pub animation_delay: f32,
}

/// `tilesets/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilesetDoc {
    #[serde(default = "default_tile_size")]
    pub tile_size: i32,
    #[serde(default)]
    pub files: Vec<String>,
    pub tiles: Vec<TileDoc>,
}

/// A parallax background layer reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ParallaxDoc {
    #[serde(rename = "img")]
    Image { path: String },
    #[serde(rename = "tilemap")]
    Tilemap {
        name: String,
        #[serde(default)]
        animated: bool,
    },
}

/// `tilemaps/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilemapDoc {
    /// `[width, height]` in tiles.
    pub size: [i32; 2],
    pub tileset: String,
    #[serde(default)]
    pub bgm: String,
    #[serde(default)]
    pub bgs: String,
    /// Row-major tile indices, `-1` for empty.
    pub tiles: Vec<Vec<i32>>,
    #[serde(default)]
    pub parallax: Vec<ParallaxDoc>,
}

/// `blueprints/<name>.json`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BlueprintDoc {
    /// Component kinds this entity carries, by registered name.
    #[serde(default)]
    pub components: Vec<String>,
    /// Per-component field overrides applied on top of component defaults.
    #[serde(default)]
    pub overrides: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraDoc {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_camera_dim")]
    pub width: i32,
    #[serde(default = "default_camera_height")]
    pub height: i32,
}

impl Default for CameraDoc {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: default_camera_dim(),
            height: default_camera_height(),
        }
    }
}

/// One entity placement in a level document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpawnDoc {
    /// Blueprint name.
    pub name: String,
    /// Per-instance component field overrides, merged over the blueprint's.
    #[serde(default)]
    pub overrides: serde_json::Map<String, Value>,
}

/// `levels/<name>.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDoc {
    pub tilemap: String,
    #[serde(default)]
    pub camera: CameraDoc,
    /// Scheduler passes this level runs. Absent means the scheduler's full
    /// built-in order.
    #[serde(default)]
    pub systems: Option<Vec<String>>,
    /// Component overrides for the player entity (blueprint `player`).
    #[serde(default)]
    pub player: serde_json::Map<String, Value>,
    #[serde(default)]
    pub entities: Vec<EntitySpawnDoc>,
}

// ---------------------------------------------------------------------------
// AssetCache
// ---------------------------------------------------------------------------

/// Caller-owned loader cache rooted at an asset directory.
///
/// Documents are parsed once and cached; runtime values (tilemaps with
/// animation state, spawned entities) are built fresh per level load.
#[derive(Debug, Default)]
pub struct AssetCache {
    root: PathBuf,
    tilesets: HashMap<String, TilesetDoc>,
    tilemaps: HashMap<String, TilemapDoc>,
    blueprints: HashMap<String, BlueprintDoc>,
}

impl AssetCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tilesets: HashMap::new(),
            tilemaps: HashMap::new(),
            blueprints: HashMap::new(),
        }
    }

    /// Drop every cached document.
    pub fn clear(&mut self) {
        self.tilesets.clear();
        self.tilemaps.clear();
        self.blueprints.clear();
        debug!("asset cache cleared");
    }

    fn read_doc<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AssetError> {
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| AssetError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Load (and cache) a tileset document.
    pub fn load_tileset(&mut self, name: &str) -> Result<&TilesetDoc, AssetError> {
        if !self.tilesets.contains_key(name) {
            let path = self.root.join("tilesets").join(format!("{name}.json"));
            let doc: TilesetDoc = Self::read_doc(&path)?;
            debug!(tileset = name, tiles = doc.tiles.len(), "tileset cached");
            self.tilesets.insert(name.to_owned(), doc);
        }
        Ok(&self.tilesets[name])
    }

    /// Load (and cache) a tilemap document.
    pub fn load_tilemap(&mut self, name: &str) -> Result<&TilemapDoc, AssetError> {
        if !self.tilemaps.contains_key(name) {
            let path = self.root.join("tilemaps").join(format!("{name}.json"));
            let doc: TilemapDoc = Self::read_doc(&path)?;
            debug!(tilemap = name, "tilemap cached");
            self.tilemaps.insert(name.to_owned(), doc);
        }
        Ok(&self.tilemaps[name])
    }

    /// Load (and cache) a blueprint document.
    pub fn load_blueprint(&mut self, name: &str) -> Result<&BlueprintDoc, AssetError> {
        if !self.blueprints.contains_key(name) {
            let path = self.root.join("blueprints").join(format!("{name}.json"));
            let doc: BlueprintDoc = Self::read_doc(&path)?;
            debug!(blueprint = name, "blueprint cached");
            self.blueprints.insert(name.to_owned(), doc);
        }
        Ok(&self.blueprints[name])
    }

    /// Build a runtime tilemap (fresh animation state) from cached
    /// documents, validating the grid against the tileset.
    pub fn build_tilemap(&mut self, name: &str) -> Result<Tilemap, AssetError> {
        let doc = self.load_tilemap(name)?.clone();
        let tileset_doc = self.load_tileset(&doc.tileset)?;

        let tiles: Vec<TileDef> = tileset_doc
            .tiles
            .iter()
            .map(|t| {
                TileDef::new(
                    t.hitbox != 0,
                    t.kind,
                    t.frames.len(),
                    t.animation_delay,
                )
            })
            .collect();
        let tileset = Tileset {
            name: doc.tileset.clone(),
            tile_size: tileset_doc.tile_size,
            tiles,
        };

        let [width, height] = doc.size;
        if doc.tiles.len() != height as usize
            || doc.tiles.iter().any(|row| row.len() != width as usize)
        {
            return Err(AssetError::GridShape {
                tilemap: name.to_owned(),
                width,
                height,
            });
        }
        for (y, row) in doc.tiles.iter().enumerate() {
            for (x, &index) in row.iter().enumerate() {
                if index != -1 && !(0..tileset.tiles.len() as i32).contains(&index) {
                    return Err(AssetError::InvalidTileIndex {
                        tilemap: name.to_owned(),
                        tileset: doc.tileset.clone(),
                        x: x as i32,
                        y: y as i32,
                        index,
                        tile_count: tileset.tiles.len(),
                    });
                }
            }
        }

        Ok(Tilemap::new(
            name.to_owned(),
            width,
            height,
            tileset,
            doc.bgm,
            doc.bgs,
            doc.tiles,
        ))
    }

    /// Spawn an entity from a blueprint, merging instance overrides over the
    /// blueprint's own.
    ///
    /// The merge is field-wise per component: the blueprint's override
    /// object supplies defaults, the instance's fields win.
    pub fn spawn_from_blueprint(
        &mut self,
        store: &mut Store,
        name: &str,
        instance_overrides: &serde_json::Map<String, Value>,
    ) -> Result<EntityId, AssetError> {
        let blueprint = self.load_blueprint(name)?.clone();
        let entity = store.spawn();
        for comp_name in &blueprint.components {
            let merged = merge_overrides(
                blueprint.overrides.get(comp_name),
                instance_overrides.get(comp_name),
            );
            store.insert_by_name(entity, comp_name, &merged)?;
        }
        debug!(blueprint = name, entity = %entity, "entity spawned");
        Ok(entity)
    }

    /// Load a level: build its tilemap and camera and spawn the player and
    /// placed entities into `store`.
    ///
    /// `fallback_systems` supplies the system list for level documents that
    /// do not name one (the scheduler's full built-in order).
    pub fn load_level(
        &mut self,
        name: &str,
        store: &mut Store,
        fallback_systems: &[&str],
    ) -> Result<Level, AssetError> {
        let path = self.root.join("levels").join(format!("{name}.json"));
        let doc: LevelDoc = Self::read_doc(&path)?;

        let tilemap = self.build_tilemap(&doc.tilemap)?;
        let camera = Camera::new(
            Vec2::new(doc.camera.x, doc.camera.y),
            doc.camera.width,
            doc.camera.height,
        );
        let systems = doc
            .systems
            .unwrap_or_else(|| fallback_systems.iter().map(|s| (*s).to_owned()).collect());

        let player = self.spawn_from_blueprint(store, "player", &doc.player)?;
        let mut entities = Vec::with_capacity(doc.entities.len());
        for spawn in &doc.entities {
            entities.push(self.spawn_from_blueprint(store, &spawn.name, &spawn.overrides)?);
        }

        debug!(level = name, entities = entities.len(), "level loaded");
        Ok(Level {
            name: name.to_owned(),
            tilemap,
            camera,
            player: Some(player),
            systems,
            entities,
        })
    }
}

/// Field-wise merge of two component override objects. Instance fields win
/// over blueprint fields; non-object values are taken whole, instance first.
fn merge_overrides(blueprint: Option<&Value>, instance: Option<&Value>) -> Value {
    match (blueprint, instance) {
        (Some(Value::Object(base)), Some(Value::Object(over))) => {
            let mut merged = base.clone();
            for (k, v) in over {
                merged.insert(k.clone(), v.clone());
            }
            Value::Object(merged)
        }
        (_, Some(instance)) => instance.clone(),
        (Some(blueprint), None) => blueprint.clone(),
        (None, None) => Value::Object(serde_json::Map::new()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
