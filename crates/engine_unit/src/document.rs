//! Unit document model.
//!
//! A unit document arrives as an already-parsed tree:
//!
//! ```text
//! { prefab?: "units/base",
//!   modified_components?: { "#<guid>": <component>, ... },
//!   components?: [ { id: <guid>, type: "transform", data: { ... } }, ... ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::CompileError;

/// One entry of a unit's `components` list, or an override value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentFragment {
    /// Stable identifier used to match prefab overrides. Never used as a
    /// runtime identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Registered component type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Type-specific payload, interpreted only by the type's encoder.
    #[serde(default)]
    pub data: Value,
}

/// A parsed unit definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitDocument {
    /// Name of the parent unit this one inherits from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefab: Option<String>,
    /// Overrides keyed by `#<guid>` of a component in the prefab root.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modified_components: BTreeMap<String, ComponentFragment>,
    /// Components declared by this document.
    #[serde(default)]
    pub components: Vec<ComponentFragment>,
}

impl UnitDocument {
    /// Interpret a parsed tree as a unit document. `path` names the document
    /// in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError::Document`] if a field has the wrong shape or a
    /// component lacks its `type`.
    pub fn from_value(value: &Value, path: &str) -> Result<Self, CompileError> {
        Self::deserialize(value).map_err(|source| CompileError::Document {
            path: path.to_string(),
            source,
        })
    }
}

/// Parse a `modified_components` key. The first character is a marker and
/// is discarded; the rest must be a GUID.
///
/// # Errors
///
/// Returns [`CompileError::MalformedGuid`] if the remainder is not a GUID.
pub fn parse_override_key(key: &str) -> Result<Uuid, CompileError> {
    let mut chars = key.chars();
    chars.next();
    Uuid::parse_str(chars.as_str()).map_err(|source| CompileError::MalformedGuid {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const GUID: &str = "6f1b3f35-3b0f-4d5b-9a47-2d1a3c6e8b10";

    #[test]
    fn test_minimal_document() {
        let doc = UnitDocument::from_value(&json!({}), "empty").unwrap();
        assert_eq!(doc, UnitDocument::default());
    }

    #[test]
    fn test_full_document() {
        let doc = UnitDocument::from_value(
            &json!({
                "prefab": "units/base",
                "modified_components": {
                    format!("#{GUID}"): { "type": "camera", "data": { "fov": 60.0 } }
                },
                "components": [
                    { "id": GUID, "type": "transform", "data": { "scale": [1, 1, 1] } }
                ]
            }),
            "units/child",
        )
        .unwrap();

        assert_eq!(doc.prefab.as_deref(), Some("units/base"));
        assert_eq!(doc.components.len(), 1);
        assert_eq!(doc.components[0].id, Some(Uuid::parse_str(GUID).unwrap()));
        assert_eq!(doc.components[0].type_name, "transform");
        assert_eq!(doc.modified_components.len(), 1);
    }

    #[test]
    fn test_component_without_type_is_rejected() {
        let err = UnitDocument::from_value(&json!({ "components": [ { "data": {} } ] }), "bad")
            .unwrap_err();
        assert!(matches!(err, CompileError::Document { ref path, .. } if path == "bad"));
    }

    #[test]
    fn test_parse_override_key() {
        let id = parse_override_key(&format!("#{GUID}")).unwrap();
        assert_eq!(id, Uuid::parse_str(GUID).unwrap());
    }

    #[test]
    fn test_parse_override_key_malformed() {
        assert!(matches!(
            parse_override_key("#not-a-guid"),
            Err(CompileError::MalformedGuid { .. })
        ));
        // Without the marker the first hex digit is lost.
        assert!(parse_override_key(GUID).is_err());
        assert!(parse_override_key("").is_err());
    }
}
