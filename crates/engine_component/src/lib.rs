//! # engine_component
//!
//! Runtime identity for units in the entity/component world.
//!
//! This crate provides:
//!
//! - [`EntityId`]: packed 24-bit index / 8-bit generation handle.
//! - [`EntityAllocator`]: generational index pool with delayed index reuse.
//! - [`DestroyCallbacks`]: ordered destroy-notification subscriptions.
//! - [`ComponentTypeId`]: FNV-1a hash of a component type name, shared by
//!   the compiler and the runtime loader.

pub mod component;
pub mod destroy;
pub mod entity;

pub use component::{ComponentTypeId, fnv1a_32, fnv1a_64};
pub use destroy::{DestroyCallbacks, SubscriberId};
pub use entity::{EntityAllocator, EntityId, UnitSpawner};
