//! Compiler configuration.

/// Default bound on the number of documents in a prefab chain, leaf included.
pub const DEFAULT_MAX_PREFAB_DEPTH: usize = 4;

/// Configuration for a [`UnitCompiler`](crate::UnitCompiler).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Maximum number of documents in a prefab chain, counting the unit
    /// being compiled. Longer chains fail with
    /// [`CompileError::PrefabTooDeep`](crate::CompileError::PrefabTooDeep).
    pub max_prefab_depth: usize,
}

impl CompilerConfig {
    /// Create a config with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_prefab_depth: DEFAULT_MAX_PREFAB_DEPTH,
        }
    }

    /// Override the prefab chain limit.
    #[must_use]
    pub fn with_max_prefab_depth(mut self, depth: usize) -> Self {
        self.max_prefab_depth = depth.max(1);
        self
    }
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}
