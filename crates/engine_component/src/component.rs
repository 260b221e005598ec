//! Component type identity.
//!
//! ## Name Hashing
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 32-bit hash algorithm. The compiler writes this value into the
//! section header of every unit resource, and the runtime loader recomputes
//! it from the same name to find the section, so the algorithm must never
//! change once resources exist on disk.
//!
//! Resource references (meshes, materials, scripts) use the 64-bit variant,
//! [`fnv1a_64`].

use serde::{Deserialize, Serialize};

const FNV32_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV32_PRIME: u32 = 0x0100_0193;

const FNV64_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV64_PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a 32-bit hash of `bytes`.
///
/// ```text
/// hash = 0x811c9dc5
/// for each byte:
///     hash = hash XOR byte
///     hash = hash * 0x01000193
/// ```
#[must_use]
pub const fn fnv1a_32(bytes: &[u8]) -> u32 {
    let mut hash = FNV32_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u32;
        hash = hash.wrapping_mul(FNV32_PRIME);
        i += 1;
    }
    hash
}

/// FNV-1a 64-bit hash of `bytes`.
#[must_use]
pub const fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash = FNV64_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV64_PRIME);
        i += 1;
    }
    hash
}

/// A unique identifier for a component type, derived from its string name.
///
/// Ordering is by raw hash value; the compiler uses it as the tie-breaker
/// when two types share a spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u32);

impl ComponentTypeId {
    /// Compute the [`ComponentTypeId`] for a component type name
    /// (e.g. `"transform"`).
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(fnv1a_32(name.as_bytes()))
    }

    /// Returns the raw 32-bit hash.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_32_known_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn test_fnv1a_64_known_vectors() {
        assert_eq!(fnv1a_64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a_64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_component_type_id_is_stable() {
        assert_eq!(
            ComponentTypeId::from_name("transform"),
            ComponentTypeId::from_name("transform")
        );
        assert_ne!(
            ComponentTypeId::from_name("transform"),
            ComponentTypeId::from_name("camera")
        );
    }

    #[test]
    fn test_component_type_id_const_eval() {
        const TRANSFORM: ComponentTypeId = ComponentTypeId::from_name("transform");
        assert_eq!(TRANSFORM.raw(), fnv1a_32(b"transform"));
    }

    #[test]
    fn test_display_is_hex() {
        assert_eq!(ComponentTypeId(0xab).to_string(), "0x000000ab");
    }
}
