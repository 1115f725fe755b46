//! Simulation constants.
//!
//! Distances are in pixels, times in seconds, masses in kilograms. One
//! meter is 100 pixels.

/// Downward acceleration, px/s^2.
pub const GRAVITY: f32 = 960.0;

/// Base drag coefficient, kg/s. Scaled per contact situation.
pub const DRAG_BASE: f32 = 0.005;
/// Drag multiplier while grounded.
pub const GROUND_DRAG: f32 = 10.0;
/// Drag multiplier while sliding down a wall.
pub const WALL_SLIDE_DRAG: f32 = 20.0;
/// Drag multiplier while airborne.
pub const AIR_DRAG: f32 = 5.0;
/// Speeds below this snap to zero.
pub const VELOCITY_EPSILON: f32 = 0.01;

/// Jump force, N.
pub const JUMP_STRENGTH: f32 = 2.8e5;
/// Seconds the jump force keeps applying while the button is held.
pub const JUMP_DURATION: f32 = 0.2;
/// Upward jump angle, degrees.
pub const JUMP_STRAIGHT_UP: f32 = 90.0;
/// Wall-jump angles off the left and right walls, degrees.
pub const JUMP_OFF_RIGHT_WALL: f32 = 120.0;
pub const JUMP_OFF_LEFT_WALL: f32 = 60.0;

/// Seconds an entity clings to a wall before sliding.
pub const WALLSTICK_DURATION: f32 = 0.5;
/// Downward velocity imposed on head bumps, px/s.
pub const CEILING_BOUNCE: f32 = 60.0;

/// Walking and running speeds, px/s.
pub const WALK_SPEED: f32 = 1500.0;
pub const RUN_SPEED: f32 = 2000.0;
/// Acceleration authority while airborne, fraction of the grounded value.
pub const AIR_CONTROL: f32 = 0.3;

/// Camera follow damping.
pub const CAMERA_DAMPING: f32 = 8.0;

/// Masses below this cannot be divided by.
pub const MIN_MASS: f32 = 1e-6;

/// Default simulation rate.
pub const FIXED_DT: f32 = 1.0 / 60.0;
