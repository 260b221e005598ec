//! # engine_unit
//!
//! Offline compiler that bakes unit definitions into a single packed unit
//! resource, indexed by component type.
//!
//! This crate provides:
//!
//! - [`ComponentTypeRegistry`]: component type name → encoder, plus the
//!   spawn-ordered listing that fixes section order in the blob.
//! - [`PrefabResolver`]: follows `prefab` chains and applies
//!   `modified_components` overrides.
//! - [`UnitCompiler`]: encodes components per type and emits the blob.
//! - [`UnitResource`]: reads a blob back, section by section.
//! - [`encoders`]: built-in encoders for the core component types.
//! - [`SourceProvider`]: where unit documents and resource lookups come from.
//!
//! ## Usage
//!
//! ```rust
//! use engine_unit::{CompilerConfig, ComponentTypeRegistry, MemorySource, UnitCompiler};
//! use engine_unit::encoders::register_builtin_components;
//!
//! let mut registry = ComponentTypeRegistry::new();
//! register_builtin_components(&mut registry);
//!
//! let source = MemorySource::new();
//! let mut compiler = UnitCompiler::new(&registry, &source, CompilerConfig::default());
//! compiler
//!     .compile_unit(&serde_json::json!({ "components": [] }))
//!     .unwrap();
//! let blob = compiler.finalize();
//! assert_eq!(blob.len(), 12);
//! ```

pub mod compiler;
pub mod config;
pub mod document;
pub mod encoders;
pub mod error;
pub mod prefab;
pub mod registry;
pub mod resource;
pub mod source;

pub use compiler::UnitCompiler;
pub use config::CompilerConfig;
pub use document::{ComponentFragment, UnitDocument};
pub use error::{CompileError, ResourceError};
pub use prefab::{PrefabResolver, ResolvedComponent};
pub use registry::{ComponentEncoder, ComponentTypeInfo, ComponentTypeRegistry, EncodeContext};
pub use resource::{ComponentData, ComponentSection, UNIT_RESOURCE_VERSION, UnitResource, UnitResourceHeader};
pub use source::{DirectorySource, MemorySource, SourceProvider};
