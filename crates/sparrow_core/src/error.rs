//! # ECS Error Types
//!
//! All errors that can occur in the ECS runtime.
//!
//! Lookups on dead or unknown entities are not errors: they return `None`
//! or `false`. Only mutations that would break an invariant and world
//! configuration problems surface as [`EcsError`].

use thiserror::Error;

use crate::ecs::{ComponentId, EntityId};

/// Errors that can occur in the ECS runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity already holds a component of this type.
    ///
    /// Remove the existing component first; the add is not retried.
    #[error("entity {entity} already has a `{component}` component")]
    DuplicateComponent {
        /// The entity that already holds the component.
        entity: EntityId,
        /// Type name of the component.
        component: &'static str,
    },

    /// A store for this component type is already registered.
    #[error("a store for `{component}` is already registered")]
    AlreadyRegistered {
        /// Type name of the component.
        component: &'static str,
    },

    /// Two distinct component types declared the same tag.
    #[error("component id {id} is claimed by `{existing}`, cannot register `{requested}`")]
    ComponentIdCollision {
        /// The contested tag.
        id: ComponentId,
        /// Type name of the store already occupying the tag.
        existing: &'static str,
        /// Type name of the component that was rejected.
        requested: &'static str,
    },

    /// An entity id does not fit in the store's sparse array.
    #[error("entity {entity} is outside the configured range of {max_entities} entities")]
    EntityOutOfRange {
        /// The offending entity id.
        entity: EntityId,
        /// Size of the sparse array.
        max_entities: usize,
    },

    /// The handle does not name a live entity of this world.
    #[error("entity {entity} is not alive in this world")]
    DeadEntity {
        /// The id carried by the handle.
        entity: EntityId,
    },

    /// Every entity id of the world is live.
    #[error("world capacity of {max_entities} entities exhausted")]
    CapacityExceeded {
        /// The configured maximum entity count.
        max_entities: usize,
    },

    /// Invalid world configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;
