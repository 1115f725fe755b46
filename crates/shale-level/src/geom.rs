//! Integer-pixel rectangle geometry.
//!
//! All collision rectangles live on the integer pixel grid with exclusive
//! right/bottom edges. Keeping coordinates integral is load-bearing for the
//! physics: a rect seated on a tile edge re-seats onto exactly the same
//! pixels tick after tick, so resting contact never jitters.

use glam::Vec2;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle on the integer pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Construct from the top-left corner and a size.
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Construct from a float center point, flooring onto the pixel grid.
    pub fn from_center(center: Vec2, width: i32, height: i32) -> Self {
        let mut rect = Self::new(0, 0, width, height);
        rect.set_center(center);
        rect
    }

    /// Exclusive right edge.
    #[inline]
    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    /// Exclusive bottom edge.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    /// Integer center point.
    #[inline]
    pub fn center(&self) -> (i32, i32) {
        (self.left + self.width / 2, self.top + self.height / 2)
    }

    /// Center point as a float vector (exact, since the center is integral).
    #[inline]
    pub fn center_f(&self) -> Vec2 {
        let (cx, cy) = self.center();
        Vec2::new(cx as f32, cy as f32)
    }

    /// Re-seat the rect so its center lands on `center`.
    ///
    /// The center is floored onto the pixel grid first and the integer
    /// half-extent subtracted after, so re-seating a rect on its own center
    /// is the identity even for odd sizes.
    pub fn set_center(&mut self, center: Vec2) {
        self.left = center.x.floor() as i32 - self.width / 2;
        self.top = center.y.floor() as i32 - self.height / 2;
    }

    /// Positive-area overlap test. Edge contact does not count, and
    /// degenerate rects overlap nothing.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right()
            && self.right() > other.left
            && self.top < other.bottom()
            && self.bottom() > other.top
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
