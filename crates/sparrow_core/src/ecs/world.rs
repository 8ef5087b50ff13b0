//! # ECS World
//!
//! The central container for entities and their components.
//!
//! The world owns the entity lifecycle: it issues ids, recycles freed ones
//! most-recent-first, and fans deletion out to every component store. Entity
//! ids are bounded by the `max_entities` fixed at creation, which is also the
//! length of every sparse array.

use std::any::Any;

use tracing::{debug, trace, warn};

use super::component::{Bundle, Component};
use super::entity::{Entity, EntityId, WorldId};
use super::query::{QueryTypes, Results, ResultsMut};
use super::registry::ComponentRegistry;
use super::storage::{ComponentStore, ABSENT, DEFAULT_STORE_CAPACITY};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS World - container for all entities and component stores.
///
/// # Capacity
///
/// The world has a fixed capacity set at creation. Creating an entity while
/// every id is live fails with [`EcsError::CapacityExceeded`]; deleting one
/// makes its id available again.
///
/// # Example
///
/// ```rust
/// use sparrow_core::{Component, World};
///
/// #[derive(Debug, PartialEq)]
/// struct Health(u32);
/// impl Component for Health { const ID: u16 = 0; }
///
/// let mut world = World::new(1_000);
/// let entity = world.create_entity(Health(100)).unwrap();
///
/// assert_eq!(world.get_component::<Health>(entity), Some(&Health(100)));
/// assert!(world.delete_entity(entity));
/// assert!(!world.is_alive(entity));
/// ```
pub struct World {
    id: WorldId,
    registry: ComponentRegistry,
    /// Recycled ids, most recently freed last.
    free_ids: Vec<EntityId>,
    /// Next never-issued id.
    next_id: u32,
    alive: Box<[bool]>,
    alive_count: usize,
    max_entities: usize,
}

impl World {
    /// Creates a new world holding at most `max_entities` live entities.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`. Use
    /// [`World::from_config`] to get an error instead.
    #[must_use]
    pub fn new(max_entities: usize) -> Self {
        assert!(max_entities > 0, "Capacity must be greater than zero");
        assert!(
            max_entities <= ABSENT as usize,
            "Capacity cannot exceed u32::MAX"
        );
        Self::build(max_entities, DEFAULT_STORE_CAPACITY)
    }

    /// Creates a world from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the configuration is rejected
    /// by [`WorldConfig::validate`].
    pub fn from_config(config: &WorldConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(config.max_entities, config.initial_store_capacity))
    }

    fn build(max_entities: usize, initial_store_capacity: usize) -> Self {
        let id = WorldId::next();
        debug!(world = id.raw(), max_entities, initial_store_capacity, "created world");
        Self {
            id,
            registry: ComponentRegistry::new(max_entities, initial_store_capacity),
            free_ids: Vec::new(),
            next_id: 0,
            alive: vec![false; max_entities].into_boxed_slice(),
            alive_count: 0,
            max_entities,
        }
    }

    /// Returns the identity of this world.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> WorldId {
        self.id
    }

    /// Returns the maximum number of live entities.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Returns the number of live entities.
    #[inline]
    #[must_use]
    pub const fn entity_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the component registry.
    #[inline]
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[inline]
    pub(crate) fn registry_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.registry
    }

    /// Registers a pre-built store for `T`, e.g. one with a larger initial
    /// dense capacity than the world default.
    ///
    /// # Errors
    ///
    /// Same as [`ComponentRegistry::register_component`].
    pub fn register_component<T: Component>(&mut self, store: ComponentStore<T>) -> EcsResult<()> {
        self.registry.register_component(store)
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Creates an entity and attaches every component of `bundle`.
    ///
    /// The id is the most recently freed one if any, otherwise the next
    /// never-issued one. Pass `()` for an entity without components.
    ///
    /// # Errors
    ///
    /// - [`EcsError::CapacityExceeded`] if every id is live.
    /// - Any error from attaching the bundle, in which case the entity is
    ///   deleted again and its id returned to the free list.
    pub fn create_entity<B: Bundle>(&mut self, bundle: B) -> EcsResult<Entity> {
        let id = self.allocate()?;
        if let Err(err) = bundle.attach(&mut self.registry, id) {
            self.release(id);
            debug!(world = self.id.raw(), entity = id.index(), error = %err, "rolled back entity creation");
            return Err(err);
        }
        trace!(world = self.id.raw(), entity = id.index(), "created entity");
        Ok(Entity::new(self.id, id))
    }

    /// Returns the handle for `id` if it is live.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<Entity> {
        let entity = Entity::new(self.id, id);
        self.is_alive(entity).then_some(entity)
    }

    /// Deletes an entity, removing all of its components.
    ///
    /// Returns `false` if the entity was not live in this world. Deleting
    /// twice is harmless.
    pub fn delete_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        self.release(entity.id());
        trace!(world = self.id.raw(), entity = entity.id().index(), "deleted entity");
        true
    }

    /// Checks whether `entity` is live in this world.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        entity.world() == self.id
            && self
                .alive
                .get(entity.id().as_usize())
                .copied()
                .unwrap_or(false)
    }

    /// Iterates over all live entities in ascending id order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        let world = self.id;
        self.alive[..self.next_id as usize]
            .iter()
            .enumerate()
            .filter(|&(_, &alive)| alive)
            .map(move |(index, _)| Entity::new(world, EntityId::new(index as u32)))
    }

    /// Deletes every entity and drops every component store.
    ///
    /// Ids are issued from zero again, so old handles become valid again
    /// once their id is reissued.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.free_ids.clear();
        self.alive.fill(false);
        self.alive_count = 0;
        self.next_id = 0;
        debug!(world = self.id.raw(), "cleared world");
    }

    fn allocate(&mut self) -> EcsResult<EntityId> {
        let id = match self.free_ids.pop() {
            Some(id) => id,
            None => {
                if self.next_id as usize >= self.max_entities {
                    warn!(world = self.id.raw(), max_entities = self.max_entities, "entity capacity exhausted");
                    return Err(EcsError::CapacityExceeded {
                        max_entities: self.max_entities,
                    });
                }
                let id = EntityId::new(self.next_id);
                self.next_id += 1;
                id
            }
        };
        self.alive[id.as_usize()] = true;
        self.alive_count += 1;
        Ok(id)
    }

    fn release(&mut self, id: EntityId) {
        self.registry.remove_components(id);
        self.alive[id.as_usize()] = false;
        self.alive_count -= 1;
        self.free_ids.push(id);
    }

    // =========================================================================
    // Entity views
    // =========================================================================

    /// Returns a read-only view of a live entity.
    #[must_use]
    pub fn entity(&self, entity: Entity) -> Option<EntityRef<'_>> {
        self.is_alive(entity).then_some(EntityRef {
            world: self,
            entity,
        })
    }

    /// Returns a mutable view of a live entity.
    pub fn entity_mut(&mut self, entity: Entity) -> Option<EntityMut<'_>> {
        if !self.is_alive(entity) {
            return None;
        }
        Some(EntityMut {
            world: self,
            entity,
        })
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Attaches a component to a live entity.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DeadEntity`] if `entity` is not live in this world.
    /// - [`EcsError::DuplicateComponent`] if it already has a `T`.
    /// - [`EcsError::ComponentIdCollision`] if another type owns `T::ID`.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        if !self.is_alive(entity) {
            return Err(EcsError::DeadEntity { entity: entity.id() });
        }
        self.registry.add_component(entity.id(), component)
    }

    /// Returns the `T` component of a live entity.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.registry.get_component_store::<T>()?.get(entity.id())
    }

    /// Returns the `T` component of a live entity mutably.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.registry.get_component_store_mut::<T>()?.get_mut(entity.id())
    }

    /// Checks whether a live entity has a `T` component.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.registry.has_component::<T>(entity.id())
    }

    /// Detaches and returns the `T` component of a live entity.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        if !self.is_alive(entity) {
            return None;
        }
        self.registry.remove_component::<T>(entity.id())
    }

    /// Returns every component of a live entity, in tag order.
    #[must_use]
    pub fn components_of(&self, entity: Entity) -> Vec<&dyn Any> {
        if !self.is_alive(entity) {
            return Vec::new();
        }
        self.registry.get_components(entity.id())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Finds every entity that has all of the component types in `Q`.
    ///
    /// `Q` is a tuple of one to four component types. The first type drives
    /// the iteration; see [`query`](super::query) for the cost model.
    #[must_use]
    pub fn find_entities_with<Q: QueryTypes>(&self) -> Results<'_, Q> {
        Results::new(self)
    }

    /// Like [`find_entities_with`](Self::find_entities_with) but hands out
    /// mutable references.
    ///
    /// A tuple naming the same type twice matches nothing.
    #[must_use]
    pub fn find_entities_with_mut<Q: QueryTypes>(&mut self) -> ResultsMut<'_, Q> {
        ResultsMut::new(self)
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("id", &self.id)
            .field("entity_count", &self.alive_count)
            .field("max_entities", &self.max_entities)
            .field("stores", &self.registry.store_count())
            .finish_non_exhaustive()
    }
}

/// Read-only view of a live entity.
#[derive(Clone, Copy)]
pub struct EntityRef<'w> {
    world: &'w World,
    entity: Entity,
}

impl<'w> EntityRef<'w> {
    /// Returns the entity handle.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns the `T` component.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&'w T> {
        self.world
            .registry
            .get_component_store::<T>()?
            .get(self.entity.id())
    }

    /// Checks for a `T` component.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.world.registry.has_component::<T>(self.entity.id())
    }

    /// Type names of every attached component, in tag order.
    #[must_use]
    pub fn component_names(&self) -> Vec<&'static str> {
        self.world.registry.component_names(self.entity.id())
    }
}

/// Mutable view of a live entity.
///
/// ```rust
/// use sparrow_core::{Component, World};
///
/// struct Name(&'static str);
/// impl Component for Name { const ID: u16 = 0; }
/// struct Score(u32);
/// impl Component for Score { const ID: u16 = 1; }
///
/// let mut world = World::new(8);
/// let entity = world.create_entity(()).unwrap();
///
/// let mut view = world.entity_mut(entity).unwrap();
/// view.add(Name("ada")).unwrap().add(Score(3)).unwrap();
/// view.get_mut::<Score>().unwrap().0 += 1;
///
/// assert_eq!(world.get_component::<Score>(entity).map(|s| s.0), Some(4));
/// ```
pub struct EntityMut<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl EntityMut<'_> {
    /// Returns the entity handle.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Attaches a component, returning the view for chaining.
    ///
    /// # Errors
    ///
    /// Same as [`World::add_component`].
    pub fn add<T: Component>(&mut self, component: T) -> EcsResult<&mut Self> {
        self.world
            .registry
            .add_component(self.entity.id(), component)?;
        Ok(self)
    }

    /// Returns the `T` component.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<&T> {
        self.world
            .registry
            .get_component_store::<T>()?
            .get(self.entity.id())
    }

    /// Returns the `T` component mutably.
    pub fn get_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.world
            .registry
            .get_component_store_mut::<T>()?
            .get_mut(self.entity.id())
    }

    /// Checks for a `T` component.
    #[must_use]
    pub fn has<T: Component>(&self) -> bool {
        self.world.registry.has_component::<T>(self.entity.id())
    }

    /// Detaches the `T` component, returning whether one was present.
    pub fn remove_type<T: Component>(&mut self) -> bool {
        self.take::<T>().is_some()
    }

    /// Detaches and returns the `T` component.
    pub fn take<T: Component>(&mut self) -> Option<T> {
        self.world.registry.remove_component::<T>(self.entity.id())
    }

    /// Deletes the entity.
    pub fn delete(self) -> bool {
        self.world.delete_entity(self.entity)
    }
}
