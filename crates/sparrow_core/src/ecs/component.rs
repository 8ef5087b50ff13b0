//! # Component System
//!
//! Components are pure data containers with no behavior.
//!
//! Every component type declares a constant tag ([`Component::ID`]). The
//! registry indexes its stores directly by that tag, so resolving the store
//! for a type is a bounds-checked vector access rather than a hash lookup.

use super::entity::EntityId;
use super::registry::ComponentRegistry;
use crate::error::EcsResult;

/// Tag identifying a component type within the process.
pub type ComponentId = u16;

/// Marker trait for ECS components.
///
/// Components must be `'static` so their stores can be downcast, and
/// `Send + Sync` so a world may be moved to or shared with another thread.
///
/// # Example
///
/// ```rust
/// use sparrow_core::Component;
///
/// #[derive(Clone, Copy, Debug, Default, PartialEq)]
/// struct Position {
///     x: f32,
///     y: f32,
/// }
///
/// impl Component for Position {
///     const ID: u16 = 0;
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Unique tag for this component type.
    ///
    /// Tags should be small and dense: the registry allocates one slot per
    /// tag up to the largest one in use. Two distinct types claiming the same
    /// tag in one world is reported as
    /// [`EcsError::ComponentIdCollision`](crate::EcsError::ComponentIdCollision).
    const ID: ComponentId;
}

/// A set of components attached to an entity in one call.
///
/// Implemented for:
/// - every [`Component`]
/// - `Option<C>` where `None` attaches nothing
/// - `()` and tuples of bundles up to eight elements
///
/// Components are attached in tuple order; the first failure stops the
/// attach and is returned.
pub trait Bundle {
    /// Attaches every component of the bundle to `entity`.
    ///
    /// # Errors
    ///
    /// Propagates the first error from
    /// [`ComponentRegistry::add_component`].
    fn attach(self, registry: &mut ComponentRegistry, entity: EntityId) -> EcsResult<()>;
}

impl<C: Component> Bundle for C {
    #[inline]
    fn attach(self, registry: &mut ComponentRegistry, entity: EntityId) -> EcsResult<()> {
        registry.add_component(entity, self)
    }
}

impl<C: Component> Bundle for Option<C> {
    #[inline]
    fn attach(self, registry: &mut ComponentRegistry, entity: EntityId) -> EcsResult<()> {
        match self {
            Some(component) => registry.add_component(entity, component),
            None => Ok(()),
        }
    }
}

impl Bundle for () {
    #[inline]
    fn attach(self, _registry: &mut ComponentRegistry, _entity: EntityId) -> EcsResult<()> {
        Ok(())
    }
}

macro_rules! impl_bundle_tuple {
    ($($name:ident),+) => {
        impl<$($name: Bundle),+> Bundle for ($($name,)+) {
            #[allow(non_snake_case)]
            fn attach(self, registry: &mut ComponentRegistry, entity: EntityId) -> EcsResult<()> {
                let ($($name,)+) = self;
                $($name.attach(registry, entity)?;)+
                Ok(())
            }
        }
    };
}

impl_bundle_tuple!(A);
impl_bundle_tuple!(A, B);
impl_bundle_tuple!(A, B, C);
impl_bundle_tuple!(A, B, C, D);
impl_bundle_tuple!(A, B, C, D, E);
impl_bundle_tuple!(A, B, C, D, E, F);
impl_bundle_tuple!(A, B, C, D, E, F, G);
impl_bundle_tuple!(A, B, C, D, E, F, G, H);
