//! Component type registration and metadata.
//!
//! Every component type used in a [`Store`](crate::store::Store) must be
//! registered at runtime in a [`ComponentRegistry`]. Registration produces a
//! [`ComponentTypeId`] used as the key for column lookups and query matching,
//! and installs a JSON deserializer so documents (blueprints, overrides) can
//! refer to components by their registered name.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentTypeId
// ---------------------------------------------------------------------------

/// Opaque, lightweight identifier for a registered component type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentTypeId(pub(crate) u32);

impl fmt::Debug for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentTypeId({})", self.0)
    }
}

/// A type-erased component value, as produced by JSON deserialization.
pub type BoxedComponent = Box<dyn Any + Send + Sync>;

/// Type-erased function that deserializes a `serde_json::Value` into a boxed
/// component value. Returns `Err` if the JSON does not match the component
/// type's schema.
type DeserializeFn =
    Box<dyn Fn(&serde_json::Value) -> Result<BoxedComponent, String> + Send + Sync>;

// ---------------------------------------------------------------------------
// ComponentInfo
// ---------------------------------------------------------------------------

/// Metadata about a registered component type.
pub struct ComponentInfo {
    /// Unique ID assigned at registration time.
    pub id: ComponentTypeId,
    /// Document-facing name (supplied by the caller).
    pub name: String,
    /// Rust `TypeId` for runtime type checking.
    pub type_id: TypeId,
    /// JSON -> boxed value conversion for this type.
    pub(crate) deserialize: DeserializeFn,
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Registry mapping Rust types and document names to [`ComponentTypeId`]s.
///
/// A type can only be registered once; subsequent registrations of the same
/// Rust `TypeId` return the existing [`ComponentTypeId`].
#[derive(Debug)]
pub struct ComponentRegistry {
    /// TypeId -> ComponentTypeId for dedup.
    by_type: HashMap<TypeId, ComponentTypeId>,
    /// Name -> ComponentTypeId for lookup from documents.
    by_name: HashMap<String, ComponentTypeId>,
    /// Indexed by ComponentTypeId.0.
    infos: Vec<ComponentInfo>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            by_type: HashMap::new(),
            by_name: HashMap::new(),
            infos: Vec::new(),
        }
    }

    /// Register a component type under the given `name`.
    ///
    /// If the type has already been registered, the existing
    /// [`ComponentTypeId`] is returned and `name` is ignored.
    pub fn register<T>(&mut self, name: &str) -> ComponentTypeId
    where
        T: Send + Sync + 'static + for<'de> serde::Deserialize<'de>,
    {
        let rust_type_id = TypeId::of::<T>();
        if let Some(&existing) = self.by_type.get(&rust_type_id) {
            return existing;
        }
        if self.by_name.contains_key(name) {
            panic!(
                "component name '{}' is already registered for a different type",
                name
            );
        }

        let id = ComponentTypeId(self.infos.len() as u32);
        let info = ComponentInfo {
            id,
            name: name.to_owned(),
            type_id: rust_type_id,
            deserialize: Box::new(|value: &serde_json::Value| {
                let typed: T = serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                Ok(Box::new(typed) as BoxedComponent)
            }),
        };
        self.infos.push(info);
        self.by_type.insert(rust_type_id, id);
        self.by_name.insert(name.to_owned(), id);
        id
    }

    /// Look up a component type by its Rust `TypeId`.
    pub fn lookup<T: 'static>(&self) -> Option<ComponentTypeId> {
        self.by_type.get(&TypeId::of::<T>()).copied()
    }

    /// Look up a component type by its registered document name.
    pub fn lookup_by_name(&self, name: &str) -> Option<ComponentTypeId> {
        self.by_name.get(name).copied()
    }

    /// Get the [`ComponentInfo`] for a registered component type ID.
    pub fn get_info(&self, id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.infos.get(id.0 as usize)
    }

    /// Deserialize a JSON value into a boxed component of the named type.
    ///
    /// Unknown names and schema mismatches are errors: documents referring to
    /// components the caller never registered are malformed.
    pub fn deserialize_named(
        &self,
        name: &str,
        value: &serde_json::Value,
    ) -> Result<(ComponentTypeId, BoxedComponent), EcsError> {
        let id = self
            .lookup_by_name(name)
            .ok_or_else(|| EcsError::UnknownComponent {
                name: name.to_owned(),
                registered: self.registered_names().join(", "),
            })?;
        let info = &self.infos[id.0 as usize];
        let boxed = (info.deserialize)(value).map_err(|details| {
            EcsError::ComponentDeserializationError {
                component: name.to_owned(),
                details,
            }
        })?;
        Ok((id, boxed))
    }

    /// Total number of registered component types.
    pub fn len(&self) -> usize {
        self.infos.len()
    }

    /// Whether any component types have been registered.
    pub fn is_empty(&self) -> bool {
        self.infos.is_empty()
    }

    /// Returns the names of all registered component types, sorted.
    pub fn registered_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
