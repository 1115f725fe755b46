//! Shale engine -- deterministic platformer simulation core.
//!
//! The engine runs a fixed set of named systems in a fixed priority order
//! over a [`Store`](shale_ecs::store::Store) and a
//! [`Level`](shale_level::level::Level). Each tick consumes one plain-data
//! [`InputSnapshot`](input::InputSnapshot), integrates velocities, resolves
//! map collisions with a backward swept-AABB pass on the integer pixel grid,
//! and keeps the entity state bitset coherent with the contacts found.
//!
//! Determinism: system order is fixed, query snapshots iterate in entity
//! index order, randomness flows through the scheduler's seeded PRNG, and
//! simulation time is computed from the tick counter rather than
//! accumulated. Same initial state + same inputs + same seed = same run.

#![deny(unsafe_code)]

pub mod ai;
pub mod clock;
pub mod collision;
pub mod components;
pub mod config;
pub mod input;
pub mod scheduler;
pub mod systems;

use shale_ecs::prelude::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Faults raised by a system pass.
///
/// A fault aborts the rest of that system's pass for the tick; the scheduler
/// logs it and carries on with the next system. Simulation state stays as
/// the pass left it.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// A mass too close to zero to divide by.
    #[error("entity {entity} has degenerate mass {mass}")]
    DegenerateMass { entity: EntityId, mass: f32 },

    /// A velocity that is NaN or infinite cannot be integrated.
    #[error("entity {entity} has non-finite velocity ({x}, {y})")]
    NonFiniteVelocity { entity: EntityId, x: f32, y: f32 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ai::{AiBehavior, AiCommand, AiCondition, AiPage, CompareOp};
    pub use crate::clock::FrameClock;
    pub use crate::components::{
        register_components, Ai, CameraFollow, Controlled, EntityCollision, EntityHit, Hitbox,
        Jump, MapCollision, Mass, NextPosition, Position, Properties, PropertyFlags, State,
        StateFlags, Velocity, Walk, WallSticking, XDirection,
    };
    pub use crate::input::InputSnapshot;
    pub use crate::scheduler::{Engine, TickContext, SYSTEM_PRIORITY};
    pub use crate::SystemError;
}
