//! The component store: sparse per-kind columns keyed by entity index.
//!
//! Entity counts in a tile-based level are small (tens, not tens of
//! thousands), so storage favors simplicity and determinism over dense
//! iteration: each registered component kind owns one hash column, and
//! signature queries return an index-sorted snapshot of matching entity IDs.
//! The snapshot is stable for the rest of the tick even if systems spawn,
//! despawn, or restructure entities while walking it.

use std::any::Any;
use std::collections::HashMap;

use crate::component::{BoxedComponent, ComponentRegistry, ComponentTypeId};
use crate::entity::{EntityAllocator, EntityId};
use crate::EcsError;

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A tuple of component types used to select entities.
///
/// Implemented for tuples of arity 1 through 5. An unregistered member type
/// simply matches nothing.
pub trait Signature {
    /// Resolve the member types to column ids, or `None` if any member is
    /// unregistered.
    fn column_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>>;
}

macro_rules! impl_signature {
    ($($t:ident),+) => {
        impl<$($t: 'static),+> Signature for ($($t,)+) {
            fn column_ids(registry: &ComponentRegistry) -> Option<Vec<ComponentTypeId>> {
                Some(vec![$(registry.lookup::<$t>()?),+])
            }
        }
    };
}

impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C);
impl_signature!(A, B, C, D);
impl_signature!(A, B, C, D, E);

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Sparse entity/component store with generational IDs and name-keyed
/// component registration.
pub struct Store {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Component type registry (names + JSON deserializers).
    registry: ComponentRegistry,
    /// One column per registered kind, indexed by `ComponentTypeId.0`,
    /// keyed by entity index. Generation checks happen before access, so
    /// plain indices are safe keys.
    columns: Vec<HashMap<u32, BoxedComponent>>,
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            registry: ComponentRegistry::new(),
            columns: Vec::new(),
        }
    }

    /// Access the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Register a component type under a document-facing name.
    ///
    /// Registration creates the storage column and installs the JSON
    /// deserializer used by [`insert_by_name`](Self::insert_by_name).
    pub fn register_component<T>(&mut self, name: &str) -> ComponentTypeId
    where
        T: Send + Sync + 'static + for<'de> serde::Deserialize<'de>,
    {
        let id = self.registry.register::<T>(name);
        if id.0 as usize >= self.columns.len() {
            self.columns.resize_with(id.0 as usize + 1, HashMap::new);
        }
        id
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Spawn a new, empty entity.
    pub fn spawn(&mut self) -> EntityId {
        self.allocator.allocate()
    }

    /// Despawn an entity, dropping all of its components.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), EcsError> {
        if !self.allocator.deallocate(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        for column in &mut self.columns {
            column.remove(&entity.index());
        }
        Ok(())
    }

    /// Whether the given handle refers to a live entity.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.allocator.alive_count()
    }

    // -- component access ---------------------------------------------------

    /// Insert (or overwrite) a component on an entity.
    pub fn insert<T>(&mut self, entity: EntityId, value: T) -> Result<(), EcsError>
    where
        T: Send + Sync + 'static,
    {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let id = self
            .registry
            .lookup::<T>()
            .ok_or_else(|| EcsError::UnknownComponent {
                name: std::any::type_name::<T>().to_owned(),
                registered: self.registry.registered_names().join(", "),
            })?;
        self.columns[id.0 as usize].insert(entity.index(), Box::new(value));
        Ok(())
    }

    /// Insert a component deserialized from JSON, by registered name.
    ///
    /// Used by blueprint instantiation. Unknown names and schema mismatches
    /// are errors (malformed documents are fatal to the load, never to the
    /// running simulation).
    pub fn insert_by_name(
        &mut self,
        entity: EntityId,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(), EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let (id, boxed) = self.registry.deserialize_named(name, value)?;
        self.columns[id.0 as usize].insert(entity.index(), boxed);
        Ok(())
    }

    /// Borrow a component, if the entity is alive and has one.
    pub fn get<T: 'static>(&self, entity: EntityId) -> Option<&T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let id = self.registry.lookup::<T>()?;
        self.columns[id.0 as usize]
            .get(&entity.index())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Mutably borrow a component, if the entity is alive and has one.
    pub fn get_mut<T: 'static>(&mut self, entity: EntityId) -> Option<&mut T> {
        if !self.allocator.is_alive(entity) {
            return None;
        }
        let id = self.registry.lookup::<T>()?;
        self.columns[id.0 as usize]
            .get_mut(&entity.index())
            .and_then(|boxed| boxed.downcast_mut::<T>())
    }

    /// Remove a component from an entity.
    ///
    /// Returns whether the component was present. Removing from a dead
    /// entity is an error; removing an absent component is not.
    pub fn remove<T: 'static>(&mut self, entity: EntityId) -> Result<bool, EcsError> {
        if !self.allocator.is_alive(entity) {
            return Err(EcsError::StaleEntity { entity });
        }
        let Some(id) = self.registry.lookup::<T>() else {
            return Ok(false);
        };
        Ok(self.columns[id.0 as usize].remove(&entity.index()).is_some())
    }

    /// Whether a live entity carries the given component.
    pub fn has<T: 'static>(&self, entity: EntityId) -> bool {
        self.get::<T>(entity).is_some()
    }

    // -- queries ------------------------------------------------------------

    /// Snapshot of all live entities carrying every component in the
    /// signature tuple, sorted by entity index.
    ///
    /// The returned list is detached from the store: structural changes made
    /// while iterating it do not disturb the iteration, and the index sort
    /// makes the order deterministic across runs.
    pub fn entities_with<S: Signature>(&self) -> Vec<EntityId> {
        let Some(ids) = S::column_ids(&self.registry) else {
            return Vec::new();
        };
        // Drive the scan from the smallest column.
        let Some(&driver) = ids
            .iter()
            .min_by_key(|id| self.columns[id.0 as usize].len())
        else {
            return Vec::new();
        };
        let mut out: Vec<EntityId> = self.columns[driver.0 as usize]
            .keys()
            .filter(|&&index| {
                ids.iter()
                    .all(|id| self.columns[id.0 as usize].contains_key(&index))
            })
            .map(|&index| self.entity_at(index))
            .filter(|&entity| self.allocator.is_alive(entity))
            .collect();
        out.sort_by_key(|entity| entity.index());
        out
    }

    /// Reconstruct the live handle for a given index. Columns only hold
    /// indices of live entities, so the allocator's current generation for
    /// the slot is the entity's generation.
    fn entity_at(&self, index: u32) -> EntityId {
        EntityId::new(index, self.allocator.current_generation(index))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("entities", &self.allocator.alive_count())
            .field("kinds", &self.registry.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
