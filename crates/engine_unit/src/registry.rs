//! Component type registry. Maps type names to encoders and fixes the
//! order component sections are emitted in.
//!
//! The registry holds one canonical set of registered types keyed by
//! [`ComponentTypeId`]. Two views are derived from it: hash-ordered lookup
//! (the map itself) and the spawn-ordered listing returned by
//! [`ComponentTypeRegistry::spawn_order`]. Because both are derived, the
//! order of `register` calls never shows up in compiled output.

use std::collections::BTreeMap;

use engine_component::ComponentTypeId;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::CompileError;
use crate::source::SourceProvider;

/// What an encoder can see while encoding one component.
pub struct EncodeContext<'a> {
    source: &'a dyn SourceProvider,
    component: &'a str,
}

impl<'a> EncodeContext<'a> {
    /// Create a context for encoding a component of type `component`.
    #[must_use]
    pub fn new(source: &'a dyn SourceProvider, component: &'a str) -> Self {
        Self { source, component }
    }

    /// The component type name being encoded.
    #[must_use]
    pub fn component(&self) -> &str {
        self.component
    }

    /// The source tree being compiled.
    #[must_use]
    pub fn source(&self) -> &dyn SourceProvider {
        self.source
    }

    /// Deserialize the component's `data` into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::ComponentData`] naming this component type.
    pub fn parse<T: DeserializeOwned>(&self, data: &Value) -> Result<T, CompileError> {
        T::deserialize(data).map_err(|source| CompileError::ComponentData {
            component: self.component.to_string(),
            source,
        })
    }

    /// Fail unless resource `name` of `kind` exists.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingResource`].
    pub fn require_resource(&self, kind: &'static str, name: &str) -> Result<(), CompileError> {
        if self.source.resource_exists(kind, name) {
            Ok(())
        } else {
            Err(CompileError::MissingResource {
                kind,
                name: name.to_string(),
            })
        }
    }
}

/// Turns one component's `data` into its packed binary payload.
///
/// The byte layout is private to the component type; the compiler only
/// concatenates the results.
pub trait ComponentEncoder: Send + Sync {
    /// Encode `data`.
    ///
    /// # Errors
    ///
    /// Returns a content error if `data` is malformed or references a
    /// resource that does not exist.
    fn encode(&self, data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError>;
}

impl<F> ComponentEncoder for F
where
    F: Fn(&Value, &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> + Send + Sync,
{
    fn encode(&self, data: &Value, ctx: &EncodeContext<'_>) -> Result<Vec<u8>, CompileError> {
        self(data, ctx)
    }
}

/// A registered type's id and spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentTypeInfo {
    /// Hash of the type name.
    pub type_id: ComponentTypeId,
    /// Lower spawns (and is emitted) first.
    pub spawn_order: u32,
}

struct RegisteredType {
    name: String,
    spawn_order: u32,
    encoder: Box<dyn ComponentEncoder>,
}

/// Registry of all component types the compiler understands.
///
/// Filled once by the host, before any unit is compiled.
#[derive(Default)]
pub struct ComponentTypeRegistry {
    types: BTreeMap<ComponentTypeId, RegisteredType>,
    /// Derived from `types`, sorted by `(spawn_order, type_id)`.
    by_spawn_order: Vec<ComponentTypeInfo>,
}

impl ComponentTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            types: BTreeMap::new(),
            by_spawn_order: Vec::new(),
        }
    }

    /// Register `encoder` for the component type `name`.
    ///
    /// Registering a name again replaces its encoder and spawn order.
    ///
    /// # Panics
    ///
    /// Panics if `name` hashes to the same id as a different, already
    /// registered name.
    pub fn register<E>(&mut self, name: &str, encoder: E, spawn_order: u32)
    where
        E: ComponentEncoder + 'static,
    {
        let type_id = ComponentTypeId::from_name(name);
        if let Some(existing) = self.types.get(&type_id) {
            assert_eq!(
                existing.name, name,
                "component type hash collision between '{}' and '{name}'",
                existing.name
            );
            debug!(component = name, "replacing component encoder");
        }

        self.types.insert(
            type_id,
            RegisteredType {
                name: name.to_string(),
                spawn_order,
                encoder: Box::new(encoder),
            },
        );
        self.rebuild_spawn_order();
    }

    fn rebuild_spawn_order(&mut self) {
        self.by_spawn_order = self
            .types
            .iter()
            .map(|(&type_id, ty)| ComponentTypeInfo {
                type_id,
                spawn_order: ty.spawn_order,
            })
            .collect();
        self.by_spawn_order
            .sort_by_key(|info| (info.spawn_order, info.type_id));
    }

    /// Returns the encoder registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn ComponentEncoder> {
        self.get(ComponentTypeId::from_name(name))
    }

    /// Returns the encoder registered under `type_id`.
    #[must_use]
    pub fn get(&self, type_id: ComponentTypeId) -> Option<&dyn ComponentEncoder> {
        self.types.get(&type_id).map(|ty| ty.encoder.as_ref())
    }

    /// Returns the name `type_id` was registered under.
    #[must_use]
    pub fn name(&self, type_id: ComponentTypeId) -> Option<&str> {
        self.types.get(&type_id).map(|ty| ty.name.as_str())
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(&ComponentTypeId::from_name(name))
    }

    /// All registered types, lowest spawn order first, ties broken by id.
    #[must_use]
    pub fn spawn_order(&self) -> &[ComponentTypeInfo] {
        &self.by_spawn_order
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl std::fmt::Debug for ComponentTypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.by_spawn_order
                    .iter()
                    .map(|info| (self.types[&info.type_id].name.as_str(), info.spawn_order)),
            )
            .finish()
    }
}
