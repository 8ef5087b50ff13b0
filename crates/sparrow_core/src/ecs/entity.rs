//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - The identity of the world that issued them
//! - An index into every sparse array of that world
//!
//! An entity carries no data of its own. Its id is only meaningful relative
//! to its world, so equality always includes the world identity.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Index of an entity inside its world.
///
/// Doubles as the index into every store's sparse array, which is why it is
/// bounded by the world's configured maximum entity count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates an entity id from its raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the raw index widened for slice access.
    #[inline]
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identity of a [`World`](super::World).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct WorldId(u32);

static NEXT_WORLD_ID: AtomicU32 = AtomicU32::new(0);

impl WorldId {
    /// Allocates a fresh world identity.
    pub(crate) fn next() -> Self {
        Self(NEXT_WORLD_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Handle to an entity.
///
/// Two handles are equal only if they carry the same id *and* were issued by
/// the same world, so numeric collisions across worlds are harmless.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    world: WorldId,
    id: EntityId,
}

impl Entity {
    #[inline]
    pub(crate) const fn new(world: WorldId, id: EntityId) -> Self {
        Self { world, id }
    }

    /// Returns the entity id within its world.
    #[inline]
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.id
    }

    /// Returns the identity of the world that issued this handle.
    #[inline]
    #[must_use]
    pub const fn world(self) -> WorldId {
        self.world
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}, world: {})", self.id.0, self.world.0)
    }
}
