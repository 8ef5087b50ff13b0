//! # World Configuration
//!
//! Sizing parameters for a [`World`](crate::World), loadable from TOML:
//!
//! ```toml
//! max_entities = 100000
//! initial_store_capacity = 64
//! ```
//!
//! Both keys are optional. Unknown keys are rejected so typos surface at
//! startup instead of silently falling back to a default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::{ABSENT, DEFAULT_STORE_CAPACITY};
use crate::error::{EcsError, EcsResult};

/// Default maximum number of live entities.
pub const DEFAULT_MAX_ENTITIES: usize = 10_000;

/// Sizing parameters for a world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Maximum number of live entities, and length of every sparse array.
    pub max_entities: usize,
    /// Dense capacity each component store starts with.
    pub initial_store_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTITIES)
    }
}

impl WorldConfig {
    /// Creates a configuration with the default store capacity.
    #[must_use]
    pub const fn new(max_entities: usize) -> Self {
        Self {
            max_entities,
            initial_store_capacity: DEFAULT_STORE_CAPACITY,
        }
    }

    /// Sets the dense capacity each component store starts with.
    #[must_use]
    pub const fn with_initial_store_capacity(mut self, capacity: usize) -> Self {
        self.initial_store_capacity = capacity;
        self
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or values rejected by [`validate`](Self::validate).
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if the file cannot be read or
    /// [`from_toml_str`](Self::from_toml_str) rejects its contents.
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EcsError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks the bounds a world can be built with.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `max_entities` is zero or
    /// exceeds `u32::MAX`, or if `initial_store_capacity` is zero.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 {
            return Err(EcsError::InvalidConfig(
                "max_entities must be greater than zero".into(),
            ));
        }
        if self.max_entities > ABSENT as usize {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities cannot exceed {ABSENT}, got {}",
                self.max_entities
            )));
        }
        if self.initial_store_capacity == 0 {
            return Err(EcsError::InvalidConfig(
                "initial_store_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
