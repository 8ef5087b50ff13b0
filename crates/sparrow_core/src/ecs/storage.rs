//! # Component Storage
//!
//! Sparse-set storage for a single component type.
//!
//! The storage uses three arrays:
//! - `components`: dense, packed component values
//! - `index_to_entity`: dense slot -> owning entity
//! - `entity_to_index`: entity id -> dense slot, or [`ABSENT`]
//!
//! The sparse array is sized once to the world's maximum entity count, so
//! membership tests never hash. The dense arrays start small and double
//! when full. Removal is a swap-remove: the tail component moves into the
//! freed slot, which is O(1) but permutes iteration order.

use std::any::{type_name, Any};

use super::component::{Component, ComponentId};
use super::entity::EntityId;
use crate::error::{EcsError, EcsResult};

/// Sparse slot value for entities without a component in the store.
pub const ABSENT: u32 = u32::MAX;

/// Initial capacity of a store's dense arrays.
pub const DEFAULT_STORE_CAPACITY: usize = 16;

/// Sparse-set storage for a single component type.
///
/// # Invariants
///
/// For every dense slot `i < len()`, `entity_to_index[index_to_entity[i]] == i`,
/// and an entity is present iff its sparse slot is not [`ABSENT`].
///
/// # Example
///
/// ```rust
/// use sparrow_core::{Component, ComponentStore, EntityId};
///
/// struct Health(u32);
/// impl Component for Health {
///     const ID: u16 = 0;
/// }
///
/// let mut store: ComponentStore<Health> = ComponentStore::new(1_000);
/// store.add(EntityId::new(42), Health(100)).unwrap();
/// assert!(store.has(EntityId::new(42)));
/// ```
pub struct ComponentStore<T> {
    /// Packed component values.
    components: Vec<T>,
    /// Owner of each dense slot.
    index_to_entity: Vec<EntityId>,
    /// Dense slot of each entity id, or `ABSENT`.
    entity_to_index: Box<[u32]>,
}

impl<T: Component> ComponentStore<T> {
    /// Creates a store for up to `max_entities` entity ids with the default
    /// dense capacity.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or does not fit below [`ABSENT`].
    #[must_use]
    pub fn new(max_entities: usize) -> Self {
        Self::with_capacity(max_entities, DEFAULT_STORE_CAPACITY)
    }

    /// Creates a store with an explicit initial dense capacity.
    ///
    /// The sparse array is allocated in full; the dense arrays hold
    /// `initial_capacity` components before their first doubling.
    ///
    /// # Panics
    ///
    /// Panics if `max_entities` is zero or does not fit below [`ABSENT`].
    #[must_use]
    pub fn with_capacity(max_entities: usize, initial_capacity: usize) -> Self {
        assert!(max_entities > 0, "Max entities must be greater than zero");
        assert!(
            max_entities <= ABSENT as usize,
            "Max entities cannot exceed u32::MAX"
        );

        let initial_capacity = initial_capacity.clamp(1, max_entities);

        Self {
            components: Vec::with_capacity(initial_capacity),
            index_to_entity: Vec::with_capacity(initial_capacity),
            entity_to_index: vec![ABSENT; max_entities].into_boxed_slice(),
        }
    }

    /// Returns the number of stored components.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if the store holds no components.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the current dense capacity.
    ///
    /// Tracked on the reverse index, which is also correct for zero-sized
    /// components whose value array never allocates.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.index_to_entity.capacity()
    }

    /// Returns the size of the sparse array.
    #[inline]
    #[must_use]
    pub fn max_entities(&self) -> usize {
        self.entity_to_index.len()
    }

    #[inline]
    fn dense_index(&self, entity: EntityId) -> Option<usize> {
        match self.entity_to_index.get(entity.as_usize()) {
            Some(&index) if index != ABSENT => Some(index as usize),
            _ => None,
        }
    }

    /// Checks if the entity has a component in this store.
    #[inline]
    #[must_use]
    pub fn has(&self, entity: EntityId) -> bool {
        self.dense_index(entity).is_some()
    }

    /// Gets the entity's component.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&T> {
        let index = self.dense_index(entity)?;
        Some(&self.components[index])
    }

    /// Gets the entity's component mutably.
    ///
    /// Writes land directly in the dense array and are visible to every
    /// later read.
    #[inline]
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        let index = self.dense_index(entity)?;
        Some(&mut self.components[index])
    }

    /// Adds a component for the entity.
    ///
    /// Appends to the dense tail. When the dense arrays are full their
    /// capacity is doubled first.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DuplicateComponent`] if the entity already has one
    /// - [`EcsError::EntityOutOfRange`] if the id does not fit the sparse array
    pub fn add(&mut self, entity: EntityId, component: T) -> EcsResult<()> {
        let max_entities = self.max_entities();
        let Some(&slot) = self.entity_to_index.get(entity.as_usize()) else {
            return Err(EcsError::EntityOutOfRange {
                entity,
                max_entities,
            });
        };
        if slot != ABSENT {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: type_name::<T>(),
            });
        }

        if self.index_to_entity.len() == self.index_to_entity.capacity() {
            self.grow();
        }

        // len < max_entities <= ABSENT, so the slot always fits.
        let index = self.components.len();
        self.components.push(component);
        self.index_to_entity.push(entity);
        self.entity_to_index[entity.as_usize()] = index as u32;

        debug_assert_eq!(self.components.len(), self.index_to_entity.len());
        Ok(())
    }

    /// Doubles the dense capacity.
    fn grow(&mut self) {
        let additional = self.index_to_entity.capacity().max(1);
        self.components.reserve_exact(additional);
        self.index_to_entity.reserve_exact(additional);
    }

    /// Removes the entity's component, returning it.
    ///
    /// The tail component is moved into the freed slot, so the dense order
    /// of the remaining components changes. Returns `None` if absent.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let index = self.dense_index(entity)?;
        let last = self.components.len() - 1;

        if index != last {
            let moved = self.index_to_entity[last];
            self.entity_to_index[moved.as_usize()] = index as u32;
        }

        self.index_to_entity.swap_remove(index);
        self.entity_to_index[entity.as_usize()] = ABSENT;
        let component = self.components.swap_remove(index);

        debug_assert_eq!(self.components.len(), self.index_to_entity.len());
        Some(component)
    }

    /// Returns the entity owning dense slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, index: usize) -> EntityId {
        self.index_to_entity[index]
    }

    /// Returns the component in dense slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    #[must_use]
    pub fn component_at(&self, index: usize) -> &T {
        &self.components[index]
    }

    /// Returns the component in dense slot `index` mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn component_at_mut(&mut self, index: usize) -> &mut T {
        &mut self.components[index]
    }

    /// Iterates in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.index_to_entity.iter().copied().zip(self.components.iter())
    }

    /// Iterates mutably in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut T)> {
        self.index_to_entity
            .iter()
            .copied()
            .zip(self.components.iter_mut())
    }

    /// Returns the owners of all dense slots, in dense order.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.index_to_entity
    }

    /// Returns the dense component array.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.components
    }

    /// Removes every component. Dense capacity is kept.
    pub fn clear(&mut self) {
        for entity in &self.index_to_entity {
            self.entity_to_index[entity.as_usize()] = ABSENT;
        }
        self.index_to_entity.clear();
        self.components.clear();
    }
}

/// Type-erased view of a [`ComponentStore`].
///
/// Lets the registry fan entity-wide operations out over stores of
/// different component types, and downcast back to the concrete store.
pub trait AnyStore: Send + Sync {
    /// Tag of the stored component type.
    fn component_id(&self) -> ComponentId;

    /// Type name of the stored component.
    fn component_name(&self) -> &'static str;

    /// Checks if the entity has a component in this store.
    fn contains(&self, entity: EntityId) -> bool;

    /// Removes the entity's component, returning whether one was present.
    fn remove_entity(&mut self, entity: EntityId) -> bool;

    /// Returns the entity's component as `Any`.
    fn component_any(&self, entity: EntityId) -> Option<&dyn Any>;

    /// Number of stored components.
    fn len(&self) -> usize;

    /// Returns true if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every component.
    fn clear(&mut self);

    /// Upcasts for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete store.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn component_id(&self) -> ComponentId {
        T::ID
    }

    fn component_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.has(entity)
    }

    fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn component_any(&self, entity: EntityId) -> Option<&dyn Any> {
        self.get(entity).map(|component| component as &dyn Any)
    }

    fn len(&self) -> usize {
        self.components.len()
    }

    fn clear(&mut self) {
        ComponentStore::clear(self);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct TestComponent {
        x: f32,
        y: f32,
    }

    impl Component for TestComponent {
        const ID: ComponentId = 0;
    }

    fn id(index: u32) -> EntityId {
        EntityId::new(index)
    }

    #[test]
    fn test_store_basic() {
        let mut store = ComponentStore::<TestComponent>::new(100);
        let comp = TestComponent { x: 10.0, y: 20.0 };

        store.add(id(1), comp).unwrap();

        assert!(store.has(id(1)));
        assert!(!store.has(id(2)));
        assert_eq!(store.get(id(1)), Some(&comp));
        assert_eq!(store.len(), 1);

        assert_eq!(store.remove(id(1)), Some(comp));
        assert!(!store.has(id(1)));
        assert_eq!(store.get(id(1)), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_duplicate_add_rejected() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(3), TestComponent { x: 1.0, y: 1.0 }).unwrap();

        let err = store.add(id(3), TestComponent { x: 2.0, y: 2.0 }).unwrap_err();

        assert!(matches!(err, EcsError::DuplicateComponent { entity, .. } if entity == id(3)));
        assert_eq!(store.get(id(3)).unwrap().x, 1.0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut store = ComponentStore::<TestComponent>::new(10);

        let err = store.add(id(10), TestComponent { x: 0.0, y: 0.0 }).unwrap_err();

        assert_eq!(
            err,
            EcsError::EntityOutOfRange {
                entity: id(10),
                max_entities: 10
            }
        );
        assert!(!store.has(id(10)));
        assert!(store.get(id(u32::MAX - 1)).is_none());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(0), TestComponent { x: 0.0, y: 0.0 }).unwrap();

        assert_eq!(store.remove(id(5)), None);
        assert_eq!(store.remove(id(50)), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_swap_remove_relocates_tail() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        for i in 0..4 {
            store.add(id(i), TestComponent { x: i as f32, y: 0.0 }).unwrap();
        }

        store.remove(id(1));

        assert_eq!(store.len(), 3);
        assert_eq!(store.entity_at(1), id(3));
        assert_eq!(store.component_at(1).x, 3.0);
        assert_eq!(store.get(id(3)).unwrap().x, 3.0);
        assert_eq!(store.entity_at(0), id(0));
        assert_eq!(store.entity_at(2), id(2));
    }

    #[test]
    fn test_remove_tail() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(4), TestComponent { x: 4.0, y: 0.0 }).unwrap();
        store.add(id(5), TestComponent { x: 5.0, y: 0.0 }).unwrap();

        store.remove(id(5));

        assert_eq!(store.len(), 1);
        assert_eq!(store.entity_at(0), id(4));
        assert!(!store.has(id(5)));
    }

    #[test]
    fn test_get_mut_persists() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(1), TestComponent { x: 1.0, y: 2.0 }).unwrap();

        if let Some(comp) = store.get_mut(id(1)) {
            comp.x = 100.0;
            comp.y = 200.0;
        }

        assert_eq!(store.get(id(1)), Some(&TestComponent { x: 100.0, y: 200.0 }));
    }

    #[test]
    fn test_growth_doubles_capacity() {
        let mut store = ComponentStore::<TestComponent>::with_capacity(100, 16);
        assert!(store.capacity() >= 16 && store.capacity() < 32);

        for i in 0..50 {
            store.add(id(i), TestComponent { x: i as f32, y: i as f32 * 2.0 }).unwrap();
        }

        assert!(store.capacity() >= 64);
        for i in 0..50 {
            let comp = store.get(id(i)).unwrap();
            assert_eq!(comp.x, i as f32);
            assert_eq!(comp.y, i as f32 * 2.0);
        }
    }

    #[test]
    fn test_rapid_creation_destruction() {
        let mut store = ComponentStore::<TestComponent>::new(100);

        for i in 0..100 {
            store.add(id(i), TestComponent { x: i as f32, y: 0.0 }).unwrap();
        }
        for i in (1..100).step_by(2) {
            store.remove(id(i));
        }

        assert_eq!(store.len(), 50);
        for i in (0..100).step_by(2) {
            assert_eq!(store.get(id(i)).unwrap().x, i as f32);
        }
        for (index, (entity, comp)) in store.iter().enumerate() {
            assert_eq!(store.entity_at(index), entity);
            assert_eq!(comp.x, entity.index() as f32);
        }
    }

    #[test]
    fn test_iter_mut_and_clear() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(1), TestComponent { x: 1.0, y: 0.0 }).unwrap();
        store.add(id(2), TestComponent { x: 2.0, y: 0.0 }).unwrap();

        for (_entity, comp) in store.iter_mut() {
            comp.y = comp.x * 10.0;
        }
        assert_eq!(store.get(id(2)).unwrap().y, 20.0);
        assert_eq!(store.entities(), &[id(1), id(2)]);

        store.clear();
        assert!(store.is_empty());
        assert!(!store.has(id(1)));
        store.add(id(1), TestComponent { x: 9.0, y: 0.0 }).unwrap();
        assert_eq!(store.as_slice().len(), 1);
    }

    #[test]
    fn test_any_store_view() {
        let mut store = ComponentStore::<TestComponent>::new(10);
        store.add(id(7), TestComponent { x: 7.0, y: 0.0 }).unwrap();

        let erased: &mut dyn AnyStore = &mut store;
        assert_eq!(erased.component_id(), 0);
        assert!(erased.component_name().ends_with("TestComponent"));
        assert!(erased.contains(id(7)));
        assert_eq!(
            erased
                .component_any(id(7))
                .and_then(|c| c.downcast_ref::<TestComponent>())
                .map(|c| c.x),
            Some(7.0)
        );
        assert!(erased.remove_entity(id(7)));
        assert!(!erased.remove_entity(id(7)));
        assert!(erased.is_empty());
    }

    #[test]
    fn test_zero_sized_component_capacity() {
        #[derive(Debug, PartialEq)]
        struct Marker;

        impl Component for Marker {
            const ID: ComponentId = 1;
        }

        let mut store = ComponentStore::<Marker>::with_capacity(100, 16);
        let initial = store.capacity();
        assert!((16..32).contains(&initial));

        for i in 0..50 {
            store.add(id(i), Marker).unwrap();
        }

        assert_eq!(store.len(), 50);
        assert!(store.capacity() >= 64);
        assert!(store.capacity() < 100 * 2);
        assert_eq!(store.get(id(49)), Some(&Marker));
    }

    #[test]
    #[should_panic(expected = "Max entities must be greater than zero")]
    fn test_zero_max_entities_panics() {
        let _ = ComponentStore::<TestComponent>::new(0);
    }
}
