//! # Query Engine
//!
//! Conjunctive queries over one to four component types.
//!
//! A query walks the dense array of its first component type (the
//! *driver*) and keeps the entities that also have every other requested
//! type, testing the other stores in order and stopping at the first miss.
//! Cost is O(len of the driver store) whatever the selectivity of the
//! others, so put the rarest component first.
//!
//! ```text
//! find_entities_with::<(Position, Velocity)>()
//!
//! Position (driver):  [e4, e0, e7, e2]   <- walked in dense order
//! Velocity (filter):  has(e4)? has(e0)? has(e7)? has(e2)?
//! ```
//!
//! Results are never snapshots. Every call to [`Results::iter`] and every
//! [`Query::iter`] reads the stores as they are at that moment.
//!
//! Requesting a type that has no store yields an empty sequence and does
//! not create the store.

use std::fmt;
use std::marker::PhantomData;

use tracing::warn;

use super::component::{Component, ComponentId};
use super::entity::{Entity, WorldId};
use super::registry::ComponentRegistry;
use super::storage::ComponentStore;
use super::world::World;

mod sealed {
    pub trait Sealed {}
}

/// Component type lists accepted by queries: `(A,)` to `(A, B, C, D)`.
///
/// This trait is sealed; it is implemented for tuples of one to four
/// [`Component`] types.
pub trait QueryTypes: sealed::Sealed + 'static {
    /// Item yielded by shared iteration, e.g. [`With2`].
    type Item<'w>;
    /// Shared borrows of the queried stores.
    type Stores<'w>: Copy;
    /// Exclusive borrows of the queried stores.
    type StoresMut<'w>;

    /// Resolves every queried store, or `None` if one is missing.
    fn fetch_stores(registry: &ComponentRegistry) -> Option<Self::Stores<'_>>;

    /// Resolves every queried store mutably, or `None` if one is missing or
    /// a type is requested twice.
    fn fetch_stores_mut(registry: &mut ComponentRegistry) -> Option<Self::StoresMut<'_>>;

    /// Number of candidates: the length of the driver store.
    fn driver_len(stores: Self::Stores<'_>) -> usize;

    /// Builds the item for dense slot `index` of the driver store, or `None`
    /// if its entity lacks one of the other components.
    fn fetch(stores: Self::Stores<'_>, index: usize, world: WorldId) -> Option<Self::Item<'_>>;
}

/// Item of a one-component query.
#[derive(Debug)]
pub struct With1<'w, A>(pub &'w A, pub Entity);

/// Item of a two-component query.
#[derive(Debug)]
pub struct With2<'w, A, B>(pub &'w A, pub &'w B, pub Entity);

/// Item of a three-component query.
#[derive(Debug)]
pub struct With3<'w, A, B, C>(pub &'w A, pub &'w B, pub &'w C, pub Entity);

/// Item of a four-component query.
#[derive(Debug)]
pub struct With4<'w, A, B, C, D>(pub &'w A, pub &'w B, pub &'w C, pub &'w D, pub Entity);

/// Mutable item of a one-component query.
#[derive(Debug)]
pub struct With1Mut<'a, A>(pub &'a mut A, pub Entity);

/// Mutable item of a two-component query.
#[derive(Debug)]
pub struct With2Mut<'a, A, B>(pub &'a mut A, pub &'a mut B, pub Entity);

/// Mutable item of a three-component query.
#[derive(Debug)]
pub struct With3Mut<'a, A, B, C>(pub &'a mut A, pub &'a mut B, pub &'a mut C, pub Entity);

/// Mutable item of a four-component query.
#[derive(Debug)]
pub struct With4Mut<'a, A, B, C, D>(
    pub &'a mut A,
    pub &'a mut B,
    pub &'a mut C,
    pub &'a mut D,
    pub Entity,
);

/// Lazy, restartable results of a query against a borrowed world.
///
/// Obtained from [`World::find_entities_with`]. Each call to
/// [`iter`](Self::iter) starts a fresh pass over the stores.
pub struct Results<'w, Q: QueryTypes> {
    stores: Option<Q::Stores<'w>>,
    world: WorldId,
}

impl<'w, Q: QueryTypes> Results<'w, Q> {
    pub(crate) fn new(world: &'w World) -> Self {
        Self {
            stores: Q::fetch_stores(world.registry()),
            world: world.id(),
        }
    }

    /// Starts a new pass over the matching entities.
    #[must_use]
    pub fn iter(&self) -> ResultsIter<'w, Q> {
        ResultsIter {
            stores: self.stores,
            index: 0,
            world: self.world,
        }
    }

    /// Counts the matching entities.
    #[must_use]
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if no entity matches.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Returns the first match in driver order.
    #[must_use]
    pub fn first(&self) -> Option<Q::Item<'w>> {
        self.iter().next()
    }
}

impl<Q: QueryTypes> fmt::Debug for Results<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Results")
            .field("world", &self.world)
            .field("resolved", &self.stores.is_some())
            .finish()
    }
}

impl<'w, Q: QueryTypes> IntoIterator for &Results<'w, Q> {
    type Item = Q::Item<'w>;
    type IntoIter = ResultsIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'w, Q: QueryTypes> IntoIterator for Results<'w, Q> {
    type Item = Q::Item<'w>;
    type IntoIter = ResultsIter<'w, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over the matches of a query.
pub struct ResultsIter<'w, Q: QueryTypes> {
    stores: Option<Q::Stores<'w>>,
    index: usize,
    world: WorldId,
}

impl<'w, Q: QueryTypes> Iterator for ResultsIter<'w, Q> {
    type Item = Q::Item<'w>;

    fn next(&mut self) -> Option<Self::Item> {
        let stores = self.stores?;
        let len = Q::driver_len(stores);
        while self.index < len {
            let index = self.index;
            self.index += 1;
            if let Some(item) = Q::fetch(stores, index, self.world) {
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .stores
            .map_or(0, |stores| Q::driver_len(stores).saturating_sub(self.index));
        (0, Some(remaining))
    }
}

/// Results of a query that hands out mutable component references.
///
/// Obtained from [`World::find_entities_with_mut`]. This is a lending
/// cursor: each item borrows the cursor, so it must be dropped before the
/// next call to `next`. Writes go straight into the stores.
///
/// ```rust
/// use sparrow_core::{Component, World, With2Mut};
///
/// struct Position(f32);
/// impl Component for Position { const ID: u16 = 0; }
/// struct Velocity(f32);
/// impl Component for Velocity { const ID: u16 = 1; }
///
/// let mut world = World::new(16);
/// world.create_entity((Position(0.0), Velocity(2.0))).unwrap();
///
/// let mut results = world.find_entities_with_mut::<(Position, Velocity)>();
/// while let Some(With2Mut(position, velocity, _)) = results.next() {
///     position.0 += velocity.0;
/// }
/// ```
pub struct ResultsMut<'w, Q: QueryTypes> {
    stores: Option<Q::StoresMut<'w>>,
    cursor: usize,
    world: WorldId,
}

impl<'w, Q: QueryTypes> ResultsMut<'w, Q> {
    pub(crate) fn new(world: &'w mut World) -> Self {
        let world_id = world.id();
        Self {
            stores: Q::fetch_stores_mut(world.registry_mut()),
            cursor: 0,
            world: world_id,
        }
    }

    /// Restarts the cursor at the beginning of the driver store.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Returns true if every queried store was resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.stores.is_some()
    }
}

impl<Q: QueryTypes> fmt::Debug for ResultsMut<'_, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultsMut")
            .field("world", &self.world)
            .field("cursor", &self.cursor)
            .field("resolved", &self.stores.is_some())
            .finish()
    }
}

/// Detached query descriptor.
///
/// Holds no borrow, so the same value can be evaluated again after the
/// world changes. Each evaluation observes the current state.
pub struct Query<Q: QueryTypes> {
    _marker: PhantomData<fn() -> Q>,
}

impl<Q: QueryTypes> Query<Q> {
    /// Creates a query descriptor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Evaluates the query against `world`.
    #[must_use]
    pub fn results<'w>(&self, world: &'w World) -> Results<'w, Q> {
        Results::new(world)
    }

    /// Starts a pass over the matches in `world`.
    #[must_use]
    pub fn iter<'w>(&self, world: &'w World) -> ResultsIter<'w, Q> {
        Results::new(world).iter()
    }

    /// Evaluates the query against `world` with mutable access.
    #[must_use]
    pub fn results_mut<'w>(&self, world: &'w mut World) -> ResultsMut<'w, Q> {
        ResultsMut::new(world)
    }
}

impl<Q: QueryTypes> Default for Query<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: QueryTypes> Clone for Query<Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: QueryTypes> Copy for Query<Q> {}

impl<Q: QueryTypes> fmt::Debug for Query<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(std::any::type_name::<Self>())
    }
}

/// Checks whether a tag occurs more than once.
fn repeats_tag(ids: &[ComponentId]) -> bool {
    ids.iter()
        .enumerate()
        .any(|(index, id)| ids[..index].contains(id))
}

macro_rules! impl_query_types {
    ($item:ident, $item_mut:ident; $A:ident $a:ident $(, $B:ident $b:ident)*) => {
        impl<$A: Component $(, $B: Component)*> sealed::Sealed for ($A, $($B,)*) {}

        impl<$A: Component $(, $B: Component)*> QueryTypes for ($A, $($B,)*) {
            type Item<'w> = $item<'w, $A $(, $B)*>;
            type Stores<'w> = (&'w ComponentStore<$A>, $(&'w ComponentStore<$B>,)*);
            type StoresMut<'w> = (&'w mut ComponentStore<$A>, $(&'w mut ComponentStore<$B>,)*);

            fn fetch_stores(registry: &ComponentRegistry) -> Option<Self::Stores<'_>> {
                Some((
                    registry.get_component_store::<$A>()?,
                    $(registry.get_component_store::<$B>()?,)*
                ))
            }

            fn fetch_stores_mut(registry: &mut ComponentRegistry) -> Option<Self::StoresMut<'_>> {
                let ids = [$A::ID, $($B::ID,)*];
                if repeats_tag(&ids) {
                    warn!(
                        ?ids,
                        query = std::any::type_name::<Self>(),
                        "mutable query names a component type twice, no matches"
                    );
                    return None;
                }
                let [$a, $($b,)*] = registry.disjoint_stores_mut(ids);
                Some((
                    $a?.as_any_mut().downcast_mut::<ComponentStore<$A>>()?,
                    $($b?.as_any_mut().downcast_mut::<ComponentStore<$B>>()?,)*
                ))
            }

            #[inline]
            fn driver_len(stores: Self::Stores<'_>) -> usize {
                stores.0.len()
            }

            #[inline]
            fn fetch(stores: Self::Stores<'_>, index: usize, world: WorldId) -> Option<Self::Item<'_>> {
                let ($a, $($b,)*) = stores;
                let id = $a.entity_at(index);
                $(let $b = $b.get(id)?;)*
                Some($item($a.component_at(index), $($b,)* Entity::new(world, id)))
            }
        }

        impl<'w, $A: Component $(, $B: Component)*> ResultsMut<'w, ($A, $($B,)*)> {
            /// Advances to the next match, lending mutable references to its
            /// components.
            #[allow(clippy::should_implement_trait)]
            pub fn next(&mut self) -> Option<$item_mut<'_, $A $(, $B)*>> {
                let world = self.world;
                let ($a, $($b,)*) = self.stores.as_mut()?;
                while self.cursor < $a.len() {
                    let index = self.cursor;
                    self.cursor += 1;
                    let id = $a.entity_at(index);
                    if true $(&& $b.has(id))* {
                        return Some($item_mut(
                            $a.component_at_mut(index),
                            $($b.get_mut(id)?,)*
                            Entity::new(world, id),
                        ));
                    }
                }
                None
            }

            /// Runs `f` on every remaining match.
            pub fn for_each(mut self, mut f: impl FnMut($item_mut<'_, $A $(, $B)*>)) {
                while let Some(item) = self.next() {
                    f(item);
                }
            }
        }
    };
}

impl_query_types!(With1, With1Mut; A a);
impl_query_types!(With2, With2Mut; A a, B b);
impl_query_types!(With3, With3Mut; A a, B b, C c);
impl_query_types!(With4, With4Mut; A a, B b, C c, D d);
