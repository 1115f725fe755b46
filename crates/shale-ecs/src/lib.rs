//! Shale ECS -- sparse entity/component store with generational identity.
//!
//! This crate provides the core store for the Shale simulation. Components
//! live in sparse per-kind columns keyed by entity index; generational entity
//! IDs enable immediate stale-reference detection. Component kinds are
//! registered under document-facing names with JSON deserializers so that
//! data files (blueprints, levels) can attach and override components by
//! name.
//!
//! # Quick Start
//!
//! ```
//! use shale_ecs::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Position { x: f32, y: f32 }
//!
//! #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
//! struct Velocity { dx: f32, dy: f32 }
//!
//! let mut store = Store::new();
//! store.register_component::<Position>("Position");
//! store.register_component::<Velocity>("Velocity");
//!
//! let entity = store.spawn();
//! store.insert(entity, Position { x: 0.0, y: 0.0 }).unwrap();
//! store.insert(entity, Velocity { dx: 1.0, dy: 0.0 }).unwrap();
//!
//! assert_eq!(store.get::<Position>(entity), Some(&Position { x: 0.0, y: 0.0 }));
//! assert_eq!(store.entities_with::<(Position, Velocity)>(), vec![entity]);
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by store operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The entity does not exist (stale generation or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity {
        entity: entity::EntityId,
    },

    /// A component type was referenced that has not been registered.
    #[error("component type '{name}' not registered. Registered components: [{registered}]")]
    UnknownComponent {
        name: String,
        registered: String,
    },

    /// Deserialization of a component value failed.
    #[error("failed to deserialize component '{component}': {details}")]
    ComponentDeserializationError {
        component: String,
        details: String,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::{ComponentInfo, ComponentRegistry, ComponentTypeId};
    pub use crate::entity::EntityId;
    pub use crate::store::{Signature, Store};
    pub use crate::EcsError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
