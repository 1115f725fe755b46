//! Level instances: a tilemap, a camera, and the entities spawned into a
//! store.

use glam::Vec2;
use shale_ecs::prelude::EntityId;

use crate::geom::Rect;
use crate::tilemap::Tilemap;

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// A centered viewport over the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// World-space center.
    pub pos: Vec2,
    /// Viewport size in pixels.
    pub width: i32,
    pub height: i32,
}

impl Camera {
    pub fn new(pos: Vec2, width: i32, height: i32) -> Self {
        Self { pos, width, height }
    }

    /// The world rect currently covered by the viewport.
    pub fn world_rect(&self) -> Rect {
        Rect::from_center(self.pos, self.width, self.height)
    }

    /// Transform a world-space point into viewport coordinates.
    pub fn world_to_view(&self, point: Vec2) -> Vec2 {
        let rect = self.world_rect();
        point - Vec2::new(rect.left as f32, rect.top as f32)
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// A loaded level: the solid world plus the entities living in it.
///
/// `systems` names the scheduler passes this level runs, in the scheduler's
/// own priority order. The player and entity handles point into the store
/// the level was loaded with.
#[derive(Debug)]
pub struct Level {
    pub name: String,
    pub tilemap: Tilemap,
    pub camera: Camera,
    pub player: Option<EntityId>,
    pub systems: Vec<String>,
    pub entities: Vec<EntityId>,
}

impl Level {
    /// Whether this level runs the named system.
    pub fn runs_system(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
