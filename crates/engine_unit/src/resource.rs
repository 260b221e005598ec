//! Unit resource binary layout.
//!
//! ```text
//! UnitResourceHeader { version: u32, num_units: u32, num_component_types: u32 }
//! repeat num_component_types:
//!   ComponentData { type_id: u32, num_instances: u32, size: u32 }
//!   owner indices [u32; num_instances]
//!   payload       [u8; size - 4 * num_instances]
//!   padding       zero bytes up to the next ComponentData alignment
//! ```
//!
//! All integers are in host byte order. Sections appear in spawn order, and
//! only component types with at least one instance get a section.

use bytemuck::{Pod, Zeroable};
use engine_component::ComponentTypeId;

use crate::error::ResourceError;

/// Bumped whenever the layout changes.
pub const UNIT_RESOURCE_VERSION: u32 = 1;

/// Resource header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct UnitResourceHeader {
    pub version: u32,
    pub num_units: u32,
    pub num_component_types: u32,
}

/// Per-type section header.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub struct ComponentData {
    /// [`ComponentTypeId`] of the section's component type.
    pub type_id: u32,
    pub num_instances: u32,
    /// Bytes of owner indices plus payload; padding excluded.
    pub size: u32,
}

const SECTION_ALIGN: usize = std::mem::align_of::<ComponentData>();
const OWNER_INDEX_SIZE: usize = std::mem::size_of::<u32>();

/// Zero bytes needed after `offset` so that a [`ComponentData`] written
/// there is aligned.
#[must_use]
pub const fn section_padding(offset: usize) -> usize {
    (SECTION_ALIGN - offset % SECTION_ALIGN) % SECTION_ALIGN
}

/// Append a header to `buf`.
pub(crate) fn write_header(buf: &mut Vec<u8>, header: &UnitResourceHeader) {
    buf.extend_from_slice(bytemuck::bytes_of(header));
}

/// Append one component section, including trailing padding.
///
/// # Panics
///
/// Panics if the section does not fit the 32-bit size field.
pub(crate) fn write_section(
    buf: &mut Vec<u8>,
    type_id: ComponentTypeId,
    owner_indices: &[u32],
    payload: &[u8],
) {
    let size = owner_indices.len() * OWNER_INDEX_SIZE + payload.len();
    let (Ok(num_instances), Ok(size)) = (u32::try_from(owner_indices.len()), u32::try_from(size))
    else {
        panic!("component section {type_id} exceeds the 32-bit size limit");
    };

    let header = ComponentData {
        type_id: type_id.raw(),
        num_instances,
        size,
    };
    buf.extend_from_slice(bytemuck::bytes_of(&header));
    buf.extend_from_slice(bytemuck::cast_slice(owner_indices));
    buf.extend_from_slice(payload);
    buf.resize(buf.len() + section_padding(buf.len()), 0);
}

/// A read-only view of one component section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSection<'a> {
    header: ComponentData,
    owner_indices: &'a [u8],
    payload: &'a [u8],
}

impl<'a> ComponentSection<'a> {
    /// Component type stored in this section.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        ComponentTypeId(self.header.type_id)
    }

    /// Number of component instances.
    #[must_use]
    pub fn num_instances(&self) -> usize {
        self.header.num_instances as usize
    }

    /// The raw section header.
    #[must_use]
    pub fn header(&self) -> &ComponentData {
        &self.header
    }

    /// Unit index owning each instance, in instance order.
    #[must_use]
    pub fn owner_indices(&self) -> Vec<u32> {
        self.owner_indices
            .chunks_exact(OWNER_INDEX_SIZE)
            .map(bytemuck::pod_read_unaligned::<u32>)
            .collect()
    }

    /// Concatenated encoder output for every instance.
    #[must_use]
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Pair each owner index with its instance's payload, for component
    /// types whose encoded size is a fixed `item_size`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::SectionSize`] if the payload is not exactly
    /// `num_instances * item_size` bytes.
    pub fn instances(&self, item_size: usize) -> Result<Vec<(u32, &'a [u8])>, ResourceError> {
        let expected = item_size.checked_mul(self.num_instances());
        if item_size == 0 || expected != Some(self.payload.len()) {
            return Err(ResourceError::SectionSize {
                type_id: self.header.type_id,
                size: self.header.size,
            });
        }
        Ok(self
            .owner_indices()
            .into_iter()
            .zip(self.payload.chunks_exact(item_size))
            .collect())
    }
}

/// A parsed unit resource borrowing from its blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitResource<'a> {
    header: UnitResourceHeader,
    sections: Vec<ComponentSection<'a>>,
}

struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], ResourceError> {
        let remaining = self.bytes.len() - self.offset;
        if len > remaining {
            return Err(ResourceError::Truncated {
                offset: self.offset,
                needed: len - remaining,
            });
        }
        let bytes: &'a [u8] = self.bytes;
        let slice = &bytes[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn read<T: Pod>(&mut self) -> Result<T, ResourceError> {
        self.take(std::mem::size_of::<T>())
            .map(bytemuck::pod_read_unaligned)
    }
}

impl<'a> UnitResource<'a> {
    /// Parse `bytes` produced by [`UnitCompiler::finalize`](crate::UnitCompiler::finalize).
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the blob is truncated, has the wrong
    /// version, or a section size is inconsistent.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ResourceError> {
        let mut reader = Reader { bytes, offset: 0 };

        let header: UnitResourceHeader = reader.read()?;
        if header.version != UNIT_RESOURCE_VERSION {
            return Err(ResourceError::VersionMismatch {
                expected: UNIT_RESOURCE_VERSION,
                found: header.version,
            });
        }

        let mut sections = Vec::with_capacity(header.num_component_types as usize);
        for _ in 0..header.num_component_types {
            let section: ComponentData = reader.read()?;
            let owners_len = section.num_instances as usize * OWNER_INDEX_SIZE;
            if (section.size as usize) < owners_len {
                return Err(ResourceError::SectionSize {
                    type_id: section.type_id,
                    size: section.size,
                });
            }

            let owner_indices = reader.take(owners_len)?;
            let payload = reader.take(section.size as usize - owners_len)?;
            reader.take(section_padding(reader.offset))?;

            sections.push(ComponentSection {
                header: section,
                owner_indices,
                payload,
            });
        }

        Ok(Self { header, sections })
    }

    /// The resource header.
    #[must_use]
    pub fn header(&self) -> &UnitResourceHeader {
        &self.header
    }

    /// Number of units baked into the resource.
    #[must_use]
    pub fn num_units(&self) -> u32 {
        self.header.num_units
    }

    /// All sections in spawn order.
    #[must_use]
    pub fn sections(&self) -> &[ComponentSection<'a>] {
        &self.sections
    }

    /// The section for `type_id`, if any instance of it was compiled.
    #[must_use]
    pub fn section(&self, type_id: ComponentTypeId) -> Option<&ComponentSection<'a>> {
        self.sections.iter().find(|s| s.type_id() == type_id)
    }
}
