//! Prefab resolution.
//!
//! A unit may name a parent unit in `prefab`, which may name its own parent,
//! and so on. The root of the chain (the first document without `prefab`)
//! supplies the component list. Every document in the chain may override
//! root components through `modified_components`, keyed by the component's
//! GUID. Overrides are applied from the root towards the unit being
//! compiled, so the most specific document wins.

use serde_json::Value;
use tracing::trace;
use uuid::Uuid;

use crate::document::{ComponentFragment, UnitDocument, parse_override_key};
use crate::error::CompileError;
use crate::source::SourceProvider;

/// One component of a fully resolved unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedComponent {
    /// GUID of the component, if it has one.
    pub id: Option<Uuid>,
    /// Registered component type name.
    pub type_name: String,
    /// Payload to hand to the type's encoder.
    pub data: Value,
}

impl From<ComponentFragment> for ResolvedComponent {
    fn from(fragment: ComponentFragment) -> Self {
        Self {
            id: fragment.id,
            type_name: fragment.type_name,
            data: fragment.data,
        }
    }
}

/// Resolves prefab chains into flat component lists.
pub struct PrefabResolver<'a> {
    source: &'a dyn SourceProvider,
    max_depth: usize,
}

impl<'a> PrefabResolver<'a> {
    /// Create a resolver that loads parents from `source` and accepts chains
    /// of at most `max_depth` documents.
    #[must_use]
    pub fn new(source: &'a dyn SourceProvider, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Resolve the unit `document`, named `path` in errors.
    ///
    /// # Errors
    ///
    /// Fails if any document in the chain is malformed, a parent is missing,
    /// the chain is too long, or an override key is not a GUID.
    pub fn resolve(&self, document: &Value, path: &str) -> Result<Vec<ResolvedComponent>, CompileError> {
        let leaf = UnitDocument::from_value(document, path)?;
        self.resolve_document(leaf, path)
    }

    /// Resolve an already-parsed unit document.
    ///
    /// # Errors
    ///
    /// See [`PrefabResolver::resolve`].
    pub fn resolve_document(
        &self,
        leaf: UnitDocument,
        path: &str,
    ) -> Result<Vec<ResolvedComponent>, CompileError> {
        let chain = self.load_chain(leaf, path)?;
        // `load_chain` always returns at least the leaf.
        let Some(root) = chain.last() else {
            return Ok(Vec::new());
        };

        let baseline = &root.components;
        let mut working = baseline.clone();

        if chain.len() > 1 {
            for document in chain.iter().rev() {
                for (key, fragment) in &document.modified_components {
                    let id = parse_override_key(key)?;
                    match baseline.iter().position(|c| c.id == Some(id)) {
                        Some(index) => {
                            let mut replacement = fragment.clone();
                            replacement.id = replacement.id.or(baseline[index].id);
                            working[index] = replacement;
                        }
                        None => trace!(unit = path, %id, "override matches no prefab component"),
                    }
                }
            }
        }

        Ok(working.into_iter().map(ResolvedComponent::from).collect())
    }

    /// Follow `prefab` links from `leaf`, returning documents leaf first.
    fn load_chain(&self, leaf: UnitDocument, path: &str) -> Result<Vec<UnitDocument>, CompileError> {
        let mut chain = vec![leaf];

        while let Some(parent) = chain.last().and_then(|doc| doc.prefab.clone()) {
            if chain.len() >= self.max_depth {
                return Err(CompileError::PrefabTooDeep {
                    path: path.to_string(),
                    max: self.max_depth,
                });
            }
            let value = self.source.read_unit(&parent)?;
            chain.push(UnitDocument::from_value(&value, &parent)?);
        }

        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::source::MemorySource;

    const A: &str = "00000000-0000-4000-8000-00000000000a";
    const B: &str = "00000000-0000-4000-8000-00000000000b";

    fn key(guid: &str) -> String {
        format!("#{guid}")
    }

    fn base_unit() -> Value {
        json!({
            "components": [
                { "id": A, "type": "transform", "data": { "v": "a" } },
                { "id": B, "type": "camera", "data": { "v": "b" } }
            ]
        })
    }

    fn data_of(components: &[ResolvedComponent]) -> Vec<Value> {
        components.iter().map(|c| c.data.clone()).collect()
    }

    #[test]
    fn test_unit_without_prefab() {
        let source = MemorySource::new();
        let resolver = PrefabResolver::new(&source, 4);
        let resolved = resolver.resolve(&base_unit(), "units/base").unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].type_name, "transform");
        assert_eq!(resolved[1].id, Some(Uuid::parse_str(B).unwrap()));
    }

    #[test]
    fn test_child_overrides_keep_position() {
        let source = MemorySource::new().with_unit("units/base", base_unit());
        let child = json!({
            "prefab": "units/base",
            "modified_components": {
                (key(B)): { "type": "camera", "data": { "v": "b2" } }
            }
        });

        let resolver = PrefabResolver::new(&source, 4);
        let resolved = resolver.resolve(&child, "units/child").unwrap();
        assert_eq!(data_of(&resolved), vec![json!({ "v": "a" }), json!({ "v": "b2" })]);
        // Override fragments without an id keep the matched component's id.
        assert_eq!(resolved[1].id, Some(Uuid::parse_str(B).unwrap()));
    }

    #[test]
    fn test_more_specific_override_wins() {
        let source = MemorySource::new()
            .with_unit("units/base", base_unit())
            .with_unit(
                "units/grandparent",
                json!({
                    "prefab": "units/base",
                    "modified_components": {
                        (key(A)): { "type": "transform", "data": { "v": "grandparent" } },
                        (key(B)): { "type": "camera", "data": { "v": "grandparent" } }
                    }
                }),
            )
            .with_unit(
                "units/parent",
                json!({
                    "prefab": "units/grandparent",
                    "modified_components": {
                        (key(A)): { "type": "transform", "data": { "v": "parent" } }
                    }
                }),
            );
        let resolver = PrefabResolver::new(&source, 4);

        let leaf = json!({ "prefab": "units/parent" });
        let resolved = resolver.resolve(&leaf, "units/leaf").unwrap();
        assert_eq!(
            data_of(&resolved),
            vec![json!({ "v": "parent" }), json!({ "v": "grandparent" })]
        );
    }

    #[test]
    fn test_unmatched_override_is_dropped() {
        let source = MemorySource::new().with_unit("units/base", base_unit());
        let child = json!({
            "prefab": "units/base",
            "modified_components": {
                key("00000000-0000-4000-8000-0000000000ff"): { "type": "light", "data": {} }
            }
        });

        let resolver = PrefabResolver::new(&source, 4);
        let resolved = resolver.resolve(&child, "units/child").unwrap();
        assert_eq!(data_of(&resolved), vec![json!({ "v": "a" }), json!({ "v": "b" })]);
    }

    #[test]
    fn test_overrides_ignored_without_prefab() {
        let mut unit = base_unit();
        unit["modified_components"] = json!({ (key(A)): { "type": "transform", "data": { "v": "x" } } });

        let source = MemorySource::new();
        let resolver = PrefabResolver::new(&source, 4);
        let resolved = resolver.resolve(&unit, "units/base").unwrap();
        assert_eq!(resolved[0].data, json!({ "v": "a" }));
    }

    #[test]
    fn test_chain_at_limit_resolves() {
        let source = MemorySource::new()
            .with_unit("u1", base_unit())
            .with_unit("u2", json!({ "prefab": "u1" }))
            .with_unit("u3", json!({ "prefab": "u2" }));
        let resolver = PrefabResolver::new(&source, 4);
        let resolved = resolver.resolve(&json!({ "prefab": "u3" }), "u4").unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_chain_too_deep() {
        let source = MemorySource::new()
            .with_unit("u1", base_unit())
            .with_unit("u2", json!({ "prefab": "u1" }))
            .with_unit("u3", json!({ "prefab": "u2" }))
            .with_unit("u4", json!({ "prefab": "u3" }));
        let resolver = PrefabResolver::new(&source, 4);
        let err = resolver.resolve(&json!({ "prefab": "u4" }), "u5").unwrap_err();
        assert!(matches!(err, CompileError::PrefabTooDeep { ref path, max: 4 } if path == "u5"));
    }

    #[test]
    fn test_prefab_cycle_hits_depth_limit() {
        let source = MemorySource::new()
            .with_unit("a", json!({ "prefab": "b" }))
            .with_unit("b", json!({ "prefab": "a" }));
        let resolver = PrefabResolver::new(&source, 4);
        assert!(matches!(
            resolver.resolve(&json!({ "prefab": "a" }), "leaf"),
            Err(CompileError::PrefabTooDeep { .. })
        ));
    }

    #[test]
    fn test_missing_parent() {
        let source = MemorySource::new();
        let resolver = PrefabResolver::new(&source, 4);
        let err = resolver
            .resolve(&json!({ "prefab": "units/gone" }), "units/child")
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::MissingResource { kind: "unit", ref name } if name == "units/gone"
        ));
    }

    #[test]
    fn test_malformed_override_key() {
        let source = MemorySource::new().with_unit("units/base", base_unit());
        let child = json!({
            "prefab": "units/base",
            "modified_components": { "#zzz": { "type": "camera", "data": {} } }
        });
        let resolver = PrefabResolver::new(&source, 4);
        assert!(matches!(
            resolver.resolve(&child, "units/child"),
            Err(CompileError::MalformedGuid { .. })
        ));
    }
}
