//! Shale level -- the solid world: tile grids, collision queries and asset
//! loading.
//!
//! A [`Tilemap`](tilemap::Tilemap) answers the three collision questions the
//! physics needs (is this cell solid, does this rect overlap a solid tile,
//! which sides of this rect are flush against solid tiles), all on an
//! integer pixel grid. The [`AssetCache`](assets::AssetCache) loads tileset,
//! tilemap, blueprint and level documents from JSON and spawns level
//! entities into a [`Store`](shale_ecs::store::Store).

#![deny(unsafe_code)]

pub mod assets;
pub mod geom;
pub mod level;
pub mod tilemap;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::assets::{
        AssetCache, AssetError, BlueprintDoc, CameraDoc, EntitySpawnDoc, LevelDoc, ParallaxDoc,
        TileDoc, TilemapDoc, TilesetDoc,
    };
    pub use crate::geom::Rect;
    pub use crate::level::{Camera, Level};
    pub use crate::tilemap::{AutotileKind, TileDef, Tilemap, Tileset, TouchSides};
}
