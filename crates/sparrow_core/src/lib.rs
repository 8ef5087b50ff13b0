//! # SPARROW Core
//!
//! Sparse-set Entity Component System (ECS) designed for:
//! - O(1) component add, remove and lookup
//! - Cache-friendly iteration over dense component arrays
//! - Conjunctive queries over one to four component types
//!
//! ## Architecture Rules
//!
//! 1. **One store per component type** - created on first use
//! 2. **Entities are plain ids** - all data lives in the stores
//! 3. **Queries are never snapshots** - every pass reads current state
//!
//! ## Example
//!
//! ```rust
//! use sparrow_core::{Component, With2, World};
//!
//! #[derive(Debug)]
//! struct Position { x: f32, y: f32 }
//! impl Component for Position { const ID: u16 = 0; }
//!
//! #[derive(Debug)]
//! struct Velocity { dx: f32, dy: f32 }
//! impl Component for Velocity { const ID: u16 = 1; }
//!
//! let mut world = World::new(1_000);
//! world.create_entity((Position { x: 0.0, y: 0.0 }, Velocity { dx: 1.0, dy: 0.5 })).unwrap();
//! world.create_entity(Position { x: 5.0, y: 5.0 }).unwrap();
//!
//! let moving = world.find_entities_with::<(Position, Velocity)>();
//! for With2(position, velocity, entity) in &moving {
//!     println!("{entity}: {position:?} moving {velocity:?}");
//! }
//! assert_eq!(moving.count(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    Bundle, Component, ComponentId, ComponentRegistry, ComponentStore, Entity, EntityId,
    EntityMut, EntityRef, Query, Results, ResultsMut, With1, With1Mut, With2, With2Mut, With3,
    With3Mut, With4, With4Mut, World, WorldId,
};
pub use error::{EcsError, EcsResult};
