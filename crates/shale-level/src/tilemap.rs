//! Tile grid model and collision queries.
//!
//! The tilemap is the solid world: a rectangular grid of tile indices into a
//! tileset, where `-1` marks an empty cell. Collision queries never scan the
//! whole grid; they restrict themselves to the tile range overlapping the
//! probe rect (plus a one-tile margin), so query cost is proportional to the
//! probe size, not the map size.

use glam::Vec2;

use crate::geom::Rect;

// ---------------------------------------------------------------------------
// Tileset
// ---------------------------------------------------------------------------

/// Autotiling category of a tile, naming the sub-image layout in the
/// tileset graphics. Renderer collaborators consume this; the simulation
/// only carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutotileKind {
    Field,
    Wall,
    Fall,
    #[default]
    Unique,
}

/// One tile definition: solidity, autotile category and animation state.
#[derive(Debug, Clone)]
pub struct TileDef {
    /// Whether the tile blocks movement.
    pub hitbox: bool,
    pub kind: AutotileKind,
    /// Number of animation frames (at least 1).
    pub frame_count: usize,
    /// Seconds between frames.
    pub animation_delay: f32,
    /// Current frame, advanced by the tile animation system.
    pub animation_frame: usize,
    pub animation_time_left: f32,
}

impl TileDef {
    pub fn new(hitbox: bool, kind: AutotileKind, frame_count: usize, animation_delay: f32) -> Self {
        Self {
            hitbox,
            kind,
            frame_count: frame_count.max(1),
            animation_delay,
            animation_frame: 0,
            animation_time_left: 0.0,
        }
    }
}

/// A named collection of tile definitions sharing one tile size.
#[derive(Debug, Clone)]
pub struct Tileset {
    pub name: String,
    pub tile_size: i32,
    pub tiles: Vec<TileDef>,
}

impl Tileset {
    /// Advance every tile's animation counter by `dt` seconds.
    ///
    /// Counters wrap modulo the frame count, so single-frame tiles are a
    /// no-op beyond the timer arithmetic.
    pub fn advance_animation(&mut self, dt: f32) {
        for tile in &mut self.tiles {
            tile.animation_time_left -= dt;
            if tile.animation_time_left < 0.0 {
                tile.animation_time_left += tile.animation_delay;
                tile.animation_frame = (tile.animation_frame + 1) % tile.frame_count;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tilemap
// ---------------------------------------------------------------------------

/// Which sides of a rect are in contact with solid tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TouchSides {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl TouchSides {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// A tile grid bound to a tileset, with collision queries.
#[derive(Debug, Clone)]
pub struct Tilemap {
    pub name: String,
    /// Grid width in tiles.
    pub width: i32,
    /// Grid height in tiles.
    pub height: i32,
    pub tileset: Tileset,
    /// Background music and sound track names.
    pub bgm: String,
    pub bgs: String,
    /// Row-major tile indices, `-1` for empty.
    grid: Vec<Vec<i32>>,
}

impl Tilemap {
    /// Build a tilemap from an already validated grid.
    ///
    /// Callers (the asset loader) must have checked that every non-negative
    /// index is in range for the tileset and that the grid is rectangular.
    pub fn new(
        name: String,
        width: i32,
        height: i32,
        tileset: Tileset,
        bgm: String,
        bgs: String,
        grid: Vec<Vec<i32>>,
    ) -> Self {
        Self {
            name,
            width,
            height,
            tileset,
            bgm,
            bgs,
            grid,
        }
    }

    /// Tile size in pixels.
    #[inline]
    pub fn tile_size(&self) -> i32 {
        self.tileset.tile_size
    }

    /// Map width in pixels.
    pub fn pixel_width(&self) -> i32 {
        self.width * self.tile_size()
    }

    /// Map height in pixels.
    pub fn pixel_height(&self) -> i32 {
        self.height * self.tile_size()
    }

    /// Tile index at a cell, or `None` outside the grid.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<i32> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some(self.grid[y as usize][x as usize])
    }

    /// Whether the cell `(x, y)` holds a solid tile.
    ///
    /// Out-of-bounds cells and empty cells are not solid.
    pub fn tile_has_hitbox(&self, x: i32, y: i32) -> bool {
        match self.tile_at(x, y) {
            Some(id) if id >= 0 => self.tileset.tiles[id as usize].hitbox,
            _ => false,
        }
    }

    /// Whether `rect` overlaps any solid tile.
    ///
    /// The scan covers the tile range under the rect plus a one-tile margin
    /// on each axis, clamped to the grid.
    pub fn rect_collides(&self, rect: &Rect) -> bool {
        let ts = self.tile_size();
        let x0 = (rect.left.div_euclid(ts) - 1).max(0);
        let x1 = (rect.right().div_euclid(ts) + 1).min(self.width);
        let y0 = (rect.top.div_euclid(ts) - 1).max(0);
        let y1 = (rect.bottom().div_euclid(ts) + 1).min(self.height);

        for x in x0..x1 {
            for y in y0..y1 {
                if self.tile_has_hitbox(x, y) {
                    let tile_rect = Rect::new(x * ts, y * ts, ts, ts);
                    if tile_rect.overlaps(rect) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Which sides of `rect` are flush against solid tiles.
    ///
    /// Each side samples the row or column of cells one pixel outside that
    /// edge, across the rect's span on the perpendicular axis. A rect
    /// embedded in a tile reports contact on the sides whose outside pixel
    /// is also solid, which is what the collision resolver wants.
    pub fn touching(&self, rect: &Rect) -> TouchSides {
        let ts = self.tile_size();
        let x0 = rect.left.div_euclid(ts).max(0);
        let x1 = ((rect.right() - 1).div_euclid(ts) + 1).min(self.width);
        let y0 = rect.top.div_euclid(ts).max(0);
        let y1 = ((rect.bottom() - 1).div_euclid(ts) + 1).min(self.height);

        let left_col = (rect.left - 1).div_euclid(ts);
        let right_col = rect.right().div_euclid(ts);
        let top_row = (rect.top - 1).div_euclid(ts);
        let bottom_row = rect.bottom().div_euclid(ts);

        TouchSides {
            left: (y0..y1).any(|y| self.tile_has_hitbox(left_col, y)),
            right: (y0..y1).any(|y| self.tile_has_hitbox(right_col, y)),
            top: (x0..x1).any(|x| self.tile_has_hitbox(x, top_row)),
            bottom: (x0..x1).any(|x| self.tile_has_hitbox(x, bottom_row)),
        }
    }

    /// The 8-neighborhood connectivity of the cell `(x, y)`: whether each
    /// neighbor holds the same tile index. Off-grid neighbors count as
    /// connected so map borders render as interior.
    ///
    /// Order: `(-1,-1) (0,-1) (1,-1) (-1,0) (1,0) (-1,1) (0,1) (1,1)`.
    pub fn tile_neighbors(&self, x: i32, y: i32) -> [bool; 8] {
        const OFFSETS: [(i32, i32); 8] = [
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ];
        let own = self.tile_at(x, y);
        let mut out = [true; 8];
        for (i, (dx, dy)) in OFFSETS.iter().enumerate() {
            if let Some(neighbor) = self.tile_at(x + dx, y + dy) {
                out[i] = Some(neighbor) == own;
            }
        }
        out
    }

    /// A world-space point's cell, by floor division.
    pub fn cell_of(&self, point: Vec2) -> (i32, i32) {
        let ts = self.tile_size();
        (
            (point.x.floor() as i32).div_euclid(ts),
            (point.y.floor() as i32).div_euclid(ts),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// A 10x6 map with a solid floor on the bottom row and a solid column
    /// at x = 8.
    fn test_map() -> Tilemap {
        let tileset = Tileset {
            name: "test".to_owned(),
            tile_size: 48,
            tiles: vec![
                TileDef::new(true, AutotileKind::Field, 1, 0.333),
                TileDef::new(false, AutotileKind::Unique, 2, 0.1),
            ],
        };
        let mut grid = vec![vec![-1; 10]; 6];
        for x in 0..10 {
            grid[5][x] = 0;
        }
        for y in 0..6 {
            grid[y][8] = 0;
        }
        grid[0][0] = 1; // decorative, no hitbox
        Tilemap::new(
            "arena".to_owned(),
            10,
            6,
            tileset,
            String::new(),
            String::new(),
            grid,
        )
    }

    #[test]
    fn hitbox_lookup_handles_bounds() {
        let map = test_map();
        assert!(map.tile_has_hitbox(0, 5));
        assert!(!map.tile_has_hitbox(0, 0)); // decorative tile
        assert!(!map.tile_has_hitbox(1, 1)); // empty
        assert!(!map.tile_has_hitbox(-1, 0));
        assert!(!map.tile_has_hitbox(0, 99));
    }

    #[test]
    fn rect_collides_with_floor() {
        let map = test_map();
        // Fully inside open air.
        assert!(!map.rect_collides(&Rect::new(100, 100, 40, 40)));
        // One pixel into the floor (floor top edge is y = 240).
        assert!(map.rect_collides(&Rect::new(100, 201, 40, 40)));
        // Resting exactly on the floor: edge contact is not overlap.
        assert!(!map.rect_collides(&Rect::new(100, 200, 40, 40)));
    }

    #[test]
    fn rect_collides_outside_map_is_free() {
        let map = test_map();
        assert!(!map.rect_collides(&Rect::new(-500, -500, 40, 40)));
        assert!(!map.rect_collides(&Rect::new(5000, 100, 40, 40)));
    }

    #[test]
    fn touching_reports_floor_contact() {
        let map = test_map();
        // Seated on the floor: bottom edge at y = 240, probe samples y = 240.
        let seated = Rect::new(100, 200, 40, 40);
        let touch = map.touching(&seated);
        assert!(touch.bottom);
        assert!(!touch.top);
        assert!(!touch.left);
        assert!(!touch.right);
    }

    #[test]
    fn touching_reports_wall_contact() {
        let map = test_map();
        // Wall column occupies x in [384, 432). Flush on its left face.
        let flush = Rect::new(344, 100, 40, 40);
        let touch = map.touching(&flush);
        assert!(touch.right);
        assert!(!touch.left);
        // One pixel of gap breaks contact.
        let gapped = Rect::new(343, 100, 40, 40);
        assert!(!map.touching(&gapped).right);
    }

    #[test]
    fn touching_one_pixel_above_floor_is_airborne() {
        let map = test_map();
        let hovering = Rect::new(100, 199, 40, 40);
        assert!(!map.touching(&hovering).bottom);
    }

    #[test]
    fn neighbors_connect_same_index_and_borders() {
        let map = test_map();
        // Floor tile mid-row: left and right neighbors are floor, above is
        // empty, below is off-grid (counts as connected).
        let n = map.tile_neighbors(4, 5);
        // Order: tl, t, tr, l, r, bl, b, br
        assert!(!n[1], "above floor is empty");
        assert!(n[3], "left is floor");
        assert!(n[4], "right is floor");
        assert!(n[6], "below the border counts as connected");
    }

    #[test]
    fn animation_advances_and_wraps() {
        let mut map = test_map();
        // Tile 1 has 2 frames at 0.1s.
        map.tileset.advance_animation(0.15);
        assert_eq!(map.tileset.tiles[1].animation_frame, 1);
        map.tileset.advance_animation(0.1);
        assert_eq!(map.tileset.tiles[1].animation_frame, 0);
    }
}
