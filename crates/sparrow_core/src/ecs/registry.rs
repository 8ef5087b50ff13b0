//! # Component Registry
//!
//! Type-keyed collection of [`ComponentStore`]s.
//!
//! Stores live in a vector indexed by [`Component::ID`]. A store is created
//! the first time any entity receives a component of its type; read paths
//! never create one.

use std::any::{type_name, Any};

use tracing::{debug, warn};

use super::component::{Component, ComponentId};
use super::entity::EntityId;
use super::storage::{AnyStore, ComponentStore, ABSENT};
use crate::error::{EcsError, EcsResult};

/// Type-keyed collection of component stores.
pub struct ComponentRegistry {
    /// One slot per component tag; `None` until first use.
    stores: Vec<Option<Box<dyn AnyStore>>>,
    /// Sparse array size for every store.
    max_entities: usize,
    /// Initial dense capacity for lazily created stores.
    initial_capacity: usize,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    ///
    /// # Arguments
    ///
    /// * `max_entities` - Sparse array size of every store created later
    /// * `initial_capacity` - Dense capacity of lazily created stores
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or exceeds `u32::MAX`, so a bad
    /// bound fails here rather than on the first add.
    #[must_use]
    pub fn new(max_entities: usize, initial_capacity: usize) -> Self {
        assert!(max_entities > 0, "Max entities must be greater than zero");
        assert!(
            max_entities <= ABSENT as usize,
            "Max entities cannot exceed u32::MAX"
        );
        Self {
            stores: Vec::new(),
            max_entities,
            initial_capacity,
        }
    }

    /// Returns the sparse array size used for new stores.
    #[inline]
    #[must_use]
    pub const fn max_entities(&self) -> usize {
        self.max_entities
    }

    /// Returns the number of registered stores.
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.stores.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterates over all registered stores.
    pub fn stores(&self) -> impl Iterator<Item = &dyn AnyStore> {
        self.stores.iter().filter_map(|slot| slot.as_deref())
    }

    /// Gets the store for `T`, if one exists.
    ///
    /// Returns `None` as well when the tag is occupied by another type.
    #[inline]
    #[must_use]
    pub fn get_component_store<T: Component>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(usize::from(T::ID))?
            .as_deref()?
            .as_any()
            .downcast_ref()
    }

    /// Gets the store for `T` mutably, if one exists.
    #[inline]
    pub fn get_component_store_mut<T: Component>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(usize::from(T::ID))?
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut()
    }

    /// Registers a pre-built store for `T`.
    ///
    /// Useful to give a hot component type a larger initial capacity.
    ///
    /// # Errors
    ///
    /// - [`EcsError::AlreadyRegistered`] if a store for `T` exists
    /// - [`EcsError::ComponentIdCollision`] if another type holds the tag
    /// - [`EcsError::InvalidConfig`] if the store's sparse array is smaller
    ///   than this registry's entity range
    pub fn register_component<T: Component>(&mut self, store: ComponentStore<T>) -> EcsResult<()> {
        if store.max_entities() < self.max_entities {
            return Err(EcsError::InvalidConfig(format!(
                "store for `{}` covers {} entities, registry needs {}",
                type_name::<T>(),
                store.max_entities(),
                self.max_entities
            )));
        }

        let slot = self.slot_mut(T::ID);
        if let Some(existing) = slot.as_deref() {
            if existing.as_any().is::<ComponentStore<T>>() {
                return Err(EcsError::AlreadyRegistered {
                    component: type_name::<T>(),
                });
            }
            return Err(collision::<T>(existing.component_name()));
        }

        debug!(component = type_name::<T>(), id = T::ID, "registered component store");
        *slot = Some(Box::new(store));
        Ok(())
    }

    /// Adds a component to an entity, creating the store on first use.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicateComponent`] if the entity already has a `T`
    /// - [`EcsError::EntityOutOfRange`] if the id exceeds the store range
    /// - [`EcsError::ComponentIdCollision`] if another type holds the tag
    pub fn add_component<T: Component>(&mut self, entity: EntityId, component: T) -> EcsResult<()> {
        self.store_or_insert::<T>()?.add(entity, component)
    }

    /// Removes the entity's `T` component, returning it.
    pub fn remove_component<T: Component>(&mut self, entity: EntityId) -> Option<T> {
        self.get_component_store_mut::<T>()?.remove(entity)
    }

    /// Checks if the entity has a `T` component.
    #[inline]
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.get_component_store::<T>()
            .is_some_and(|store| store.has(entity))
    }

    /// Removes the entity from every store that holds it.
    ///
    /// Returns the number of components removed.
    pub fn remove_components(&mut self, entity: EntityId) -> usize {
        let mut removed = 0;
        for store in self.stores.iter_mut().flatten() {
            if store.remove_entity(entity) {
                removed += 1;
            }
        }
        removed
    }

    /// Collects every component currently attached to the entity.
    ///
    /// Diagnostic path: allocates, and visits every store.
    #[must_use]
    pub fn get_components(&self, entity: EntityId) -> Vec<&dyn Any> {
        self.stores()
            .filter_map(|store| store.component_any(entity))
            .collect()
    }

    /// Lists the type names of the entity's components.
    #[must_use]
    pub fn component_names(&self, entity: EntityId) -> Vec<&'static str> {
        self.stores()
            .filter(|store| store.contains(entity))
            .map(AnyStore::component_name)
            .collect()
    }

    /// Drops every store.
    pub fn clear(&mut self) {
        self.stores.clear();
    }

    /// Borrows several stores mutably at once.
    ///
    /// Each position of the result holds the store for the tag at the same
    /// position of `ids`, or `None` if it has no store. A tag requested twice
    /// is only filled at its first position.
    pub(crate) fn disjoint_stores_mut<const N: usize>(
        &mut self,
        ids: [ComponentId; N],
    ) -> [Option<&mut (dyn AnyStore + 'static)>; N] {
        let mut found: [Option<&mut (dyn AnyStore + 'static)>; N] = std::array::from_fn(|_| None);
        for (index, slot) in self.stores.iter_mut().enumerate() {
            let Some(store) = slot.as_deref_mut() else {
                continue;
            };
            if let Some(position) = ids.iter().position(|&id| usize::from(id) == index) {
                found[position] = Some(store);
            }
        }
        found
    }

    fn slot_mut(&mut self, id: ComponentId) -> &mut Option<Box<dyn AnyStore>> {
        let index = usize::from(id);
        if index >= self.stores.len() {
            self.stores.resize_with(index + 1, || None);
        }
        &mut self.stores[index]
    }

    fn store_or_insert<T: Component>(&mut self) -> EcsResult<&mut ComponentStore<T>> {
        let max_entities = self.max_entities;
        let initial_capacity = self.initial_capacity;

        let store = self.slot_mut(T::ID).get_or_insert_with(|| {
            debug!(component = type_name::<T>(), id = T::ID, "created component store");
            Box::new(ComponentStore::<T>::with_capacity(max_entities, initial_capacity))
        });

        let existing = store.component_name();
        store
            .as_any_mut()
            .downcast_mut()
            .ok_or_else(|| collision::<T>(existing))
    }
}

/// Builds the error for a tag already held by the store of `existing`.
fn collision<T: Component>(existing: &'static str) -> EcsError {
    warn!(
        id = T::ID,
        existing,
        requested = type_name::<T>(),
        "component id collision"
    );
    EcsError::ComponentIdCollision {
        id: T::ID,
        existing,
        requested: type_name::<T>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Component for Position {
        const ID: ComponentId = 0;
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    impl Component for Velocity {
        const ID: ComponentId = 3;
    }

    /// Claims the same tag as `Velocity`.
    #[derive(Debug)]
    struct Impostor;

    impl Component for Impostor {
        const ID: ComponentId = 3;
    }

    fn id(index: u32) -> EntityId {
        EntityId::new(index)
    }

    #[test]
    fn test_lazy_store_creation() {
        let mut registry = ComponentRegistry::new(100, 16);
        assert!(registry.get_component_store::<Position>().is_none());
        assert_eq!(registry.store_count(), 0);

        registry.add_component(id(1), Position { x: 1.0, y: 2.0 }).unwrap();

        assert_eq!(registry.store_count(), 1);
        let store = registry.get_component_store::<Position>().unwrap();
        assert_eq!(store.get(id(1)), Some(&Position { x: 1.0, y: 2.0 }));
        assert_eq!(store.max_entities(), 100);
        // Reads do not create stores.
        assert!(!registry.has_component::<Velocity>(id(1)));
        assert_eq!(registry.store_count(), 1);
    }

    #[test]
    fn test_duplicate_component_propagates() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(2), Position { x: 0.0, y: 0.0 }).unwrap();

        let err = registry
            .add_component(id(2), Position { x: 1.0, y: 1.0 })
            .unwrap_err();

        assert!(matches!(err, EcsError::DuplicateComponent { .. }));
    }

    #[test]
    fn test_register_component_twice() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry
            .register_component(ComponentStore::<Position>::with_capacity(10, 64))
            .unwrap();

        let err = registry
            .register_component(ComponentStore::<Position>::new(10))
            .unwrap_err();

        assert!(matches!(err, EcsError::AlreadyRegistered { .. }));
        assert!(registry.get_component_store::<Position>().unwrap().capacity() >= 10);
    }

    #[test]
    fn test_register_rejects_small_store() {
        let mut registry = ComponentRegistry::new(10, 4);

        let err = registry
            .register_component(ComponentStore::<Position>::new(5))
            .unwrap_err();

        assert!(matches!(err, EcsError::InvalidConfig(_)));
    }

    #[test]
    fn test_component_id_collision() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(0), Velocity { dx: 1.0, dy: 0.0 }).unwrap();

        let err = registry.add_component(id(1), Impostor).unwrap_err();

        assert!(matches!(err, EcsError::ComponentIdCollision { id: 3, .. }));
        assert!(registry.get_component_store::<Impostor>().is_none());
        assert!(registry.has_component::<Velocity>(id(0)));
    }

    #[test]
    fn test_remove_components_fans_out() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(1), Position { x: 1.0, y: 1.0 }).unwrap();
        registry.add_component(id(1), Velocity { dx: 1.0, dy: 1.0 }).unwrap();
        registry.add_component(id(2), Position { x: 2.0, y: 2.0 }).unwrap();

        assert_eq!(registry.remove_components(id(1)), 2);

        assert!(!registry.has_component::<Position>(id(1)));
        assert!(!registry.has_component::<Velocity>(id(1)));
        assert!(registry.has_component::<Position>(id(2)));
        assert_eq!(registry.remove_components(id(1)), 0);
    }

    #[test]
    fn test_get_components() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(4), Position { x: 4.0, y: 4.0 }).unwrap();
        registry.add_component(id(4), Velocity { dx: 0.5, dy: 0.5 }).unwrap();

        let components = registry.get_components(id(4));
        assert_eq!(components.len(), 2);
        assert!(components.iter().any(|c| c.downcast_ref::<Position>().is_some()));
        assert!(components.iter().any(|c| c.downcast_ref::<Velocity>().is_some()));

        let names = registry.component_names(id(4));
        assert!(names.iter().any(|name| name.ends_with("Velocity")));
        assert!(registry.get_components(id(5)).is_empty());
    }

    #[test]
    fn test_remove_component() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(1), Position { x: 3.0, y: 3.0 }).unwrap();

        assert_eq!(registry.remove_component::<Position>(id(1)), Some(Position { x: 3.0, y: 3.0 }));
        assert_eq!(registry.remove_component::<Position>(id(1)), None);
        assert_eq!(registry.remove_component::<Velocity>(id(1)), None);
    }

    #[test]
    #[should_panic(expected = "Max entities must be greater than zero")]
    fn test_zero_max_entities_panics_at_construction() {
        let _ = ComponentRegistry::new(0, 16);
    }

    #[test]
    fn test_disjoint_stores_mut() {
        let mut registry = ComponentRegistry::new(10, 4);
        registry.add_component(id(1), Position { x: 0.0, y: 0.0 }).unwrap();
        registry.add_component(id(1), Velocity { dx: 0.0, dy: 0.0 }).unwrap();

        let [velocities, positions, missing] =
            registry.disjoint_stores_mut([Velocity::ID, Position::ID, 9]);
        assert!(missing.is_none());
        assert_eq!(velocities.unwrap().component_id(), Velocity::ID);
        assert_eq!(positions.unwrap().component_id(), Position::ID);

        let [first, second] = registry.disjoint_stores_mut([Position::ID, Position::ID]);
        assert!(first.is_some());
        assert!(second.is_none());
    }
}
