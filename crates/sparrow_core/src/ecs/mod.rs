//! # Entity Component System
//!
//! A sparse-set ECS: one dense component array per type, addressed through a
//! sparse array indexed by entity id.
//!
//! ## Design Philosophy
//!
//! - O(1) add, remove and lookup per component type
//! - Dense arrays are iterated directly, in insertion order modulo swap-remove
//! - Entity ids are plain indices, recycled most-recent-first
//! - Component stores are created lazily on first use of a type

mod component;
mod entity;
pub mod query;
mod registry;
mod storage;
mod world;

pub use component::{Bundle, Component, ComponentId};
pub use entity::{Entity, EntityId, WorldId};
pub use query::{
    Query, QueryTypes, Results, ResultsIter, ResultsMut, With1, With1Mut, With2, With2Mut, With3,
    With3Mut, With4, With4Mut,
};
pub use registry::ComponentRegistry;
pub use storage::{AnyStore, ComponentStore, ABSENT, DEFAULT_STORE_CAPACITY};
pub use world::{EntityMut, EntityRef, World};
