//! Compiler and resource error types.

/// Content and structural errors raised while compiling a unit.
///
/// Any of these aborts the unit being compiled; nothing from that unit is
/// written to the resource.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// A component names a type that was never registered.
    #[error("unknown component type: '{0}'")]
    UnknownComponentType(String),

    /// An enumerated field (projection, light type, ...) has an unknown value.
    #[error("unknown {kind} type: '{name}'")]
    UnknownVariant { kind: &'static str, name: String },

    /// A referenced resource does not exist in the source tree.
    #[error("{kind} resource does not exist: '{name}'")]
    MissingResource { kind: &'static str, name: String },

    /// The prefab chain starting at `path` is longer than allowed.
    #[error("prefab chain starting at '{path}' exceeds maximum depth of {max}")]
    PrefabTooDeep { path: String, max: usize },

    /// A `modified_components` key is not `#<guid>`.
    #[error("malformed component id '{key}': {source}")]
    MalformedGuid {
        key: String,
        #[source]
        source: uuid::Error,
    },

    /// A unit document does not have the expected shape.
    #[error("invalid unit document '{path}': {source}")]
    Document {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A component's `data` does not match what its encoder expects.
    #[error("invalid data for component '{component}': {source}")]
    ComponentData {
        component: String,
        #[source]
        source: serde_json::Error,
    },

    /// Reading a source file failed.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Wraps any other error with the unit it came from.
    #[error("failed to compile unit {unit}: {source}")]
    InUnit {
        unit: String,
        #[source]
        source: Box<CompileError>,
    },
}

impl CompileError {
    /// Attach the offending unit to this error, unless it already has one.
    #[must_use]
    pub fn in_unit(self, unit: impl Into<String>) -> Self {
        match self {
            err @ Self::InUnit { .. } => err,
            err => Self::InUnit {
                unit: unit.into(),
                source: Box::new(err),
            },
        }
    }

    /// The innermost error, skipping [`CompileError::InUnit`] wrappers.
    #[must_use]
    pub fn root(&self) -> &CompileError {
        match self {
            Self::InUnit { source, .. } => source.root(),
            err => err,
        }
    }
}

/// Errors raised while reading a unit resource blob.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The blob ends before a complete structure could be read.
    #[error("unit resource truncated at offset {offset}: need {needed} more bytes")]
    Truncated { offset: usize, needed: usize },

    /// The blob was written by an incompatible compiler.
    #[error("unit resource version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },

    /// A section's declared size cannot hold its owner-index array, or its
    /// payload does not divide into the requested instance size.
    #[error("invalid section size for component type {type_id:#010x}: {size} bytes")]
    SectionSize { type_id: u32, size: u32 },
}
