//! Simulation components and the entity state/property bitsets.
//!
//! Every component deserializes from a JSON object with `#[serde(default)]`
//! so blueprint documents can override individual fields and leave the rest
//! at their defaults. Field names are part of the document format.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use shale_ecs::prelude::{EntityId, Store};
use shale_level::geom::Rect;

use crate::ai::AiBehavior;
use crate::config;

// ---------------------------------------------------------------------------
// State and property flags
// ---------------------------------------------------------------------------

bitflags! {
    /// What an entity is currently doing.
    ///
    /// The named unions (CAN_JUMP, CAN_MOVE, ...) are queried with
    /// [`State::has`], which tests for any overlapping bit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StateFlags: u32 {
        const ON_GROUND = 1 << 0;
        const FALLING = 1 << 1;
        const JUMPING = 1 << 2;
        const WALKING = 1 << 3;
        const RUNNING = 1 << 4;
        const CROUCHING = 1 << 5;
        const WALL_STICKING = 1 << 6;
        const WALL_SLIDING = 1 << 7;
        const DASHING = 1 << 8;
        const HANGING = 1 << 9;
        const CLIMBING = 1 << 10;
        const FREEZED = 1 << 11;
        const SLOWED = 1 << 12;
        const SHIELDED = 1 << 13;
        const HURTED = 1 << 14;
        const INVISIBLE = 1 << 15;

        const IGNORE_GRAVITY = Self::ON_GROUND.bits()
            | Self::WALL_STICKING.bits()
            | Self::FREEZED.bits()
            | Self::DASHING.bits()
            | Self::HANGING.bits();
        const CAN_JUMP = Self::ON_GROUND.bits()
            | Self::WALL_STICKING.bits()
            | Self::WALL_SLIDING.bits()
            | Self::HANGING.bits()
            | Self::CLIMBING.bits();
        const CAN_MOVE = Self::ON_GROUND.bits()
            | Self::FALLING.bits()
            | Self::HANGING.bits()
            | Self::CLIMBING.bits();
        const MOVING = Self::WALKING.bits()
            | Self::RUNNING.bits()
            | Self::JUMPING.bits()
            | Self::DASHING.bits()
            | Self::FALLING.bits()
            | Self::WALL_SLIDING.bits()
            | Self::CLIMBING.bits();
        const NO_DRAG = Self::CROUCHING.bits()
            | Self::WALL_STICKING.bits()
            | Self::DASHING.bits()
            | Self::HANGING.bits()
            | Self::FREEZED.bits()
            | Self::CLIMBING.bits();
    }
}

impl Default for StateFlags {
    fn default() -> Self {
        StateFlags::empty()
    }
}

bitflags! {
    /// What an entity intrinsically is, independent of what it is doing.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct PropertyFlags: u32 {
        /// Passes through entity collisions.
        const PHASABLE = 1 << 0;
        /// Exempt from gravity and drag.
        const FLOATING = 1 << 1;
    }
}

impl Default for PropertyFlags {
    fn default() -> Self {
        PropertyFlags::empty()
    }
}

// ---------------------------------------------------------------------------
// Kinematics
// ---------------------------------------------------------------------------

/// Authoritative world-space position, center of the entity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set(&mut self, v: Vec2) {
        self.x = v.x;
        self.y = v.y;
    }
}

/// Where the entity wants to be next tick, before collision resolution.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NextPosition {
    pub x: f32,
    pub y: f32,
}

impl NextPosition {
    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set(&mut self, v: Vec2) {
        self.x = v.x;
        self.y = v.y;
    }
}

/// Velocity in px/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub fn vec(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set(&mut self, v: Vec2) {
        self.x = v.x;
        self.y = v.y;
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Mass in kg. Scales drag and divides jump force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mass {
    pub value: f32,
}

impl Default for Mass {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

/// Which way the entity faces: 1.0 right, -1.0 left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XDirection {
    pub value: f32,
}

impl Default for XDirection {
    fn default() -> Self {
        Self { value: 1.0 }
    }
}

/// Collision box. `x`/`y` track the float center between ticks; the
/// integer [`Rect`] used for the grid tests is derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub width: i32,
    pub height: i32,
}

impl Default for Hitbox {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 1, height: 1 }
    }
}

impl Hitbox {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x;
        self.y = center.y;
    }

    /// The integer pixel rect centered on the float center.
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.center(), self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The entity's state bitset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub flags: StateFlags,
}

impl State {
    /// Whether any bit of `flags` is set. Composite masks like
    /// [`StateFlags::CAN_JUMP`] test "is any of these true".
    pub fn has(&self, flags: StateFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Whether every bit of `flags` is set.
    pub fn has_all(&self, flags: StateFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn add(&mut self, flags: StateFlags) {
        self.flags.insert(flags);
    }

    pub fn remove(&mut self, flags: StateFlags) {
        self.flags.remove(flags);
    }
}

/// The entity's intrinsic property bitset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Properties {
    pub flags: PropertyFlags,
}

impl Properties {
    pub fn has(&self, flags: PropertyFlags) -> bool {
        self.flags.intersects(flags)
    }
}

// ---------------------------------------------------------------------------
// Abilities and intent
// ---------------------------------------------------------------------------

/// Marks the entity driven by player input.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Controlled {}

/// Jump ability and its per-jump scratch state.
///
/// `direction` is the launch angle in degrees (90 straight up) and is set
/// when the jump starts; `time_left` counts down the thrust window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Jump {
    pub direction: f32,
    pub strength: f32,
    pub duration: f32,
    pub time_left: f32,
}

impl Default for Jump {
    fn default() -> Self {
        Self {
            direction: 0.0,
            strength: config::JUMP_STRENGTH,
            duration: config::JUMP_DURATION,
            time_left: 0.0,
        }
    }
}

/// Wall-cling ability. `time_left` counts down while stuck to a wall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallSticking {
    pub time_left: f32,
    pub duration: f32,
}

impl Default for WallSticking {
    fn default() -> Self {
        Self { time_left: 0.0, duration: config::WALLSTICK_DURATION }
    }
}

/// Ground movement ability: accelerations for the two gaits, px/s^2.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Walk {
    pub walk_speed: f32,
    pub run_speed: f32,
}

impl Default for Walk {
    fn default() -> Self {
        Self { walk_speed: config::WALK_SPEED, run_speed: config::RUN_SPEED }
    }
}

/// Makes the camera track this entity.
///
/// `deadzone` is the size of the centered box the entity can roam without
/// moving the camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraFollow {
    pub deadzone: [i32; 2],
    pub damping: f32,
}

impl Default for CameraFollow {
    fn default() -> Self {
        Self { deadzone: [0, 0], damping: config::CAMERA_DAMPING }
    }
}

// ---------------------------------------------------------------------------
// Collision records
// ---------------------------------------------------------------------------

/// Which sides of the entity touched solid tiles this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MapCollision {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl MapCollision {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// One entity-vs-entity overlap recorded this tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityHit {
    pub entity: EntityId,
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

/// Which sides of the entity touched other entities this tick, and who.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityCollision {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
    pub hits: Vec<EntityHit>,
}

impl EntityCollision {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Ai
// ---------------------------------------------------------------------------

/// Scripted or autonomous behavior, plus the interpreter's scratch state.
///
/// `page` is the active script page (None when no page condition holds),
/// `command_index` the cursor inside it. `wait_timer` and `airborne` are
/// the scratch used by the wait and jump commands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ai {
    pub behavior: AiBehavior,
    pub page: Option<usize>,
    pub command_index: usize,
    pub wait_timer: f32,
    pub airborne: bool,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Register every simulation component under its document name.
pub fn register_components(store: &mut Store) {
    store.register_component::<Position>("Position");
    store.register_component::<NextPosition>("NextPosition");
    store.register_component::<Velocity>("Velocity");
    store.register_component::<Mass>("Mass");
    store.register_component::<XDirection>("XDirection");
    store.register_component::<Hitbox>("Hitbox");
    store.register_component::<State>("State");
    store.register_component::<Properties>("Properties");
    store.register_component::<Controlled>("Controlled");
    store.register_component::<Jump>("Jump");
    store.register_component::<WallSticking>("WallSticking");
    store.register_component::<Walk>("Walk");
    store.register_component::<CameraFollow>("CameraFollow");
    store.register_component::<MapCollision>("MapCollision");
    store.register_component::<EntityCollision>("EntityCollision");
    store.register_component::<Ai>("Ai");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn composite_masks_cover_their_members() {
        assert!(StateFlags::CAN_JUMP.contains(StateFlags::ON_GROUND));
        assert!(StateFlags::CAN_JUMP.contains(StateFlags::WALL_SLIDING));
        assert!(!StateFlags::CAN_JUMP.contains(StateFlags::FALLING));
        assert!(StateFlags::NO_DRAG.contains(StateFlags::WALL_STICKING));
        assert!(StateFlags::IGNORE_GRAVITY.contains(StateFlags::HANGING));
    }

    #[test]
    fn state_has_tests_any_overlap() {
        let mut state = State::default();
        state.add(StateFlags::WALL_SLIDING);
        assert!(state.has(StateFlags::CAN_JUMP));
        assert!(!state.has_all(StateFlags::CAN_JUMP));
        state.remove(StateFlags::CAN_JUMP);
        assert!(state.flags.is_empty());
    }

    #[test]
    fn components_deserialize_with_partial_overrides() {
        let jump: Jump = serde_json::from_value(json!({ "duration": 0.35 })).unwrap();
        assert_eq!(jump.duration, 0.35);
        assert_eq!(jump.strength, config::JUMP_STRENGTH);

        let walk: Walk = serde_json::from_value(json!({})).unwrap();
        assert_eq!(walk.walk_speed, config::WALK_SPEED);

        let mass: Mass = serde_json::from_value(json!({ "value": 2.5 })).unwrap();
        assert_eq!(mass.value, 2.5);
    }

    #[test]
    fn hitbox_rect_is_centered_on_float_center() {
        let hitbox = Hitbox { x: 100.0, y: 200.0, width: 40, height: 40 };
        let rect = hitbox.rect();
        assert_eq!((rect.left, rect.top), (80, 180));
        assert_eq!((rect.right(), rect.bottom()), (120, 220));
    }

    #[test]
    fn state_flags_roundtrip_through_json() {
        let mut state = State::default();
        state.add(StateFlags::ON_GROUND | StateFlags::WALKING);
        let value = serde_json::to_value(state).unwrap();
        let back: State = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn full_component_set_registers_without_collisions() {
        let mut store = Store::new();
        register_components(&mut store);
        let entity = store.spawn();
        store
            .insert_by_name(entity, "Velocity", &json!({ "x": 3.0 }))
            .unwrap();
        assert_eq!(store.get::<Velocity>(entity).unwrap().x, 3.0);
    }
}
