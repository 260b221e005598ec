//! Where unit documents and resource lookups come from.
//!
//! The compiler never touches the filesystem directly. Prefab parents are
//! fetched and resource references are checked through a [`SourceProvider`],
//! so hosts can compile from disk, from memory, or from a packed archive.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::CompileError;

/// Access to the source tree being compiled.
pub trait SourceProvider {
    /// Read and parse the unit named `name` (no extension).
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::MissingResource`] if no such unit exists, or
    /// an I/O or parse error if it cannot be read.
    fn read_unit(&self, name: &str) -> Result<Value, CompileError>;

    /// Returns `true` if a resource of `kind` (e.g. `"mesh"`, `"lua"`) named
    /// `name` exists.
    fn resource_exists(&self, kind: &str, name: &str) -> bool;
}

impl<S: SourceProvider + ?Sized> SourceProvider for &S {
    fn read_unit(&self, name: &str) -> Result<Value, CompileError> {
        (**self).read_unit(name)
    }

    fn resource_exists(&self, kind: &str, name: &str) -> bool {
        (**self).resource_exists(kind, name)
    }
}

/// In-memory source tree.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    units: HashMap<String, Value>,
    /// Resource names by kind.
    resources: HashMap<String, HashSet<String>>,
}

impl MemorySource {
    /// Create an empty source tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit document under `name`.
    #[must_use]
    pub fn with_unit(mut self, name: impl Into<String>, document: Value) -> Self {
        self.insert_unit(name, document);
        self
    }

    /// Declare that resource `name` of `kind` exists.
    #[must_use]
    pub fn with_resource(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.insert_resource(kind, name);
        self
    }

    /// Add or replace a unit document.
    pub fn insert_unit(&mut self, name: impl Into<String>, document: Value) {
        self.units.insert(name.into(), document);
    }

    /// Declare a resource.
    pub fn insert_resource(&mut self, kind: impl Into<String>, name: impl Into<String>) {
        self.resources
            .entry(kind.into())
            .or_default()
            .insert(name.into());
    }
}

impl SourceProvider for MemorySource {
    fn read_unit(&self, name: &str) -> Result<Value, CompileError> {
        self.units
            .get(name)
            .cloned()
            .ok_or_else(|| CompileError::MissingResource {
                kind: "unit",
                name: name.to_string(),
            })
    }

    fn resource_exists(&self, kind: &str, name: &str) -> bool {
        if kind == "unit" && self.units.contains_key(name) {
            return true;
        }
        self.resources
            .get(kind)
            .is_some_and(|names| names.contains(name))
    }
}

/// Source tree rooted at a directory.
///
/// Unit `name` lives at `<root>/<name>.unit` as JSON; a resource `name` of
/// `kind` lives at `<root>/<name>.<kind>`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    unit_extension: String,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            unit_extension: "unit".to_string(),
        }
    }

    /// Override the unit source extension (default `unit`).
    #[must_use]
    pub fn with_unit_extension(mut self, extension: impl Into<String>) -> Self {
        self.unit_extension = extension.into();
        self
    }

    /// The directory this source reads from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resource_path(&self, kind: &str, name: &str) -> PathBuf {
        self.root.join(format!("{name}.{kind}"))
    }
}

impl SourceProvider for DirectorySource {
    fn read_unit(&self, name: &str) -> Result<Value, CompileError> {
        let path = self.resource_path(&self.unit_extension, name);
        if !path.is_file() {
            return Err(CompileError::MissingResource {
                kind: "unit",
                name: name.to_string(),
            });
        }

        let text = std::fs::read_to_string(&path).map_err(|source| CompileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CompileError::Document {
            path: path.display().to_string(),
            source,
        })
    }

    fn resource_exists(&self, kind: &str, name: &str) -> bool {
        let kind = if kind == "unit" {
            self.unit_extension.as_str()
        } else {
            kind
        };
        self.resource_path(kind, name).is_file()
    }
}
