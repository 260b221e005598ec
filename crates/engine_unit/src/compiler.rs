//! Unit compiler. Turns resolved units into a packed unit resource.
//!
//! The compiler accumulates one byte buffer and one owner-index array per
//! component type across any number of units, then emits them all as a
//! single blob. One compiler instance belongs to one compile job.

use std::collections::BTreeMap;

use engine_component::ComponentTypeId;
use serde_json::Value;
use tracing::debug;

use crate::config::CompilerConfig;
use crate::error::CompileError;
use crate::prefab::PrefabResolver;
use crate::registry::{ComponentTypeRegistry, EncodeContext};
use crate::resource::{UNIT_RESOURCE_VERSION, UnitResourceHeader, write_header, write_section};
use crate::source::SourceProvider;

/// Compiled instances of one component type.
#[derive(Debug, Default)]
struct ComponentTypeData {
    /// Index of the unit owning each instance.
    unit_index: Vec<u32>,
    /// Concatenated encoder output, same order as `unit_index`.
    data: Vec<u8>,
}

impl ComponentTypeData {
    fn num(&self) -> usize {
        self.unit_index.len()
    }
}

/// Compiles units against a fixed [`ComponentTypeRegistry`].
pub struct UnitCompiler<'a> {
    registry: &'a ComponentTypeRegistry,
    source: &'a dyn SourceProvider,
    config: CompilerConfig,
    num_units: u32,
    component_data: BTreeMap<ComponentTypeId, ComponentTypeData>,
}

impl<'a> UnitCompiler<'a> {
    /// Create a compiler. `source` supplies prefab parents and answers
    /// resource-existence checks.
    #[must_use]
    pub fn new(
        registry: &'a ComponentTypeRegistry,
        source: &'a dyn SourceProvider,
        config: CompilerConfig,
    ) -> Self {
        Self {
            registry,
            source,
            config,
            num_units: 0,
            component_data: BTreeMap::new(),
        }
    }

    /// Number of units compiled so far.
    #[must_use]
    pub fn num_units(&self) -> u32 {
        self.num_units
    }

    /// Number of compiled instances of `type_id` so far.
    #[must_use]
    pub fn num_instances(&self, type_id: ComponentTypeId) -> usize {
        self.component_data.get(&type_id).map_or(0, ComponentTypeData::num)
    }

    /// Compile the unit named `name`, read through the source provider.
    ///
    /// # Errors
    ///
    /// See [`UnitCompiler::compile_unit`].
    pub fn compile_unit_path(&mut self, name: &str) -> Result<(), CompileError> {
        let document = self
            .source
            .read_unit(name)
            .map_err(|err| err.in_unit(name))?;
        self.compile_named(&document, name)
    }

    /// Compile one unit document and append its components.
    ///
    /// On error nothing from this unit is recorded and the unit counter does
    /// not advance.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::InUnit`] wrapping the content error.
    pub fn compile_unit(&mut self, document: &Value) -> Result<(), CompileError> {
        let name = format!("#{}", self.num_units);
        self.compile_named(document, &name)
    }

    /// Compile `documents` in order as consecutive units of one resource.
    ///
    /// Stops at the first unit that fails; units before it stay compiled.
    /// Use [`UnitCompiler::compile_all`] to keep going past failing units.
    ///
    /// # Errors
    ///
    /// Returns the failing unit's error.
    pub fn compile_many<'d, I>(&mut self, documents: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = &'d Value>,
    {
        for document in documents {
            self.compile_unit(document)?;
        }
        Ok(())
    }

    /// Compile every document in `documents`, skipping the ones that fail.
    ///
    /// A failing unit leaves no data behind and does not take a unit index,
    /// so the compiled units stay densely numbered. Returns the errors of
    /// the skipped units in input order.
    pub fn compile_all<'d, I>(&mut self, documents: I) -> Vec<CompileError>
    where
        I: IntoIterator<Item = &'d Value>,
    {
        documents
            .into_iter()
            .filter_map(|document| self.compile_unit(document).err())
            .collect()
    }

    fn compile_named(&mut self, document: &Value, name: &str) -> Result<(), CompileError> {
        let staged = self.encode_unit(document, name).map_err(|err| err.in_unit(name))?;

        let unit_index = self.num_units;
        for (type_id, bytes) in staged {
            let ctd = self.component_data.entry(type_id).or_default();
            ctd.data.extend_from_slice(&bytes);
            ctd.unit_index.push(unit_index);
        }
        self.num_units += 1;

        debug!(unit = name, unit_index, "compiled unit");
        Ok(())
    }

    /// Resolve and encode every component of a unit without touching the
    /// accumulated state.
    fn encode_unit(
        &self,
        document: &Value,
        name: &str,
    ) -> Result<Vec<(ComponentTypeId, Vec<u8>)>, CompileError> {
        let resolver = PrefabResolver::new(self.source, self.config.max_prefab_depth);
        let components = resolver.resolve(document, name)?;

        components
            .iter()
            .map(|component| -> Result<_, CompileError> {
                let type_id = ComponentTypeId::from_name(&component.type_name);
                let encoder = self
                    .registry
                    .get(type_id)
                    .ok_or_else(|| CompileError::UnknownComponentType(component.type_name.clone()))?;
                let ctx = EncodeContext::new(self.source, &component.type_name);
                Ok((type_id, encoder.encode(&component.data, &ctx)?))
            })
            .collect()
    }

    /// Emit the unit resource.
    ///
    /// Sections follow the registry's spawn order; types with no instances
    /// are left out.
    #[must_use]
    pub fn finalize(&self) -> Vec<u8> {
        let populated: Vec<(ComponentTypeId, &ComponentTypeData)> = self
            .registry
            .spawn_order()
            .iter()
            .filter_map(|info| {
                self.component_data
                    .get(&info.type_id)
                    .filter(|ctd| ctd.num() > 0)
                    .map(|ctd| (info.type_id, ctd))
            })
            .collect();

        let mut buf = Vec::new();
        write_header(
            &mut buf,
            &UnitResourceHeader {
                version: UNIT_RESOURCE_VERSION,
                num_units: self.num_units,
                num_component_types: populated.len() as u32,
            },
        );

        for (type_id, ctd) in populated {
            debug!(
                component = self.registry.name(type_id).unwrap_or("?"),
                instances = ctd.num(),
                bytes = ctd.data.len(),
                "writing component section"
            );
            write_section(&mut buf, type_id, &ctd.unit_index, &ctd.data);
        }

        buf
    }
}
