//! Lantern ECS -- entity ids and per-aspect component repositories.
//!
//! This crate is the storage layer of the Lantern simulation. It is not a
//! general-purpose ECS: there is no archetype storage and no query language.
//! Instead each aspect of an entity lives in its own *repository*, a sparse
//! map from [`EntityId`](entity::EntityId) to one component value, and game
//! code calls the repository's aspect-specific operations directly.
//!
//! # Quick Start
//!
//! ```
//! use lantern_ecs::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Lamp { lit: bool }
//!
//! struct LampRepository { store: ComponentStore<Lamp> }
//! lantern_ecs::impl_store_repository!(LampRepository);
//!
//! let mut registry = EntityRegistry::new();
//! let mut lamps = LampRepository { store: ComponentStore::new("lamp") };
//!
//! let entity = registry.create();
//! lamps.create_component(entity);
//! lamps.store.get_mut(entity).unwrap().lit = true;
//!
//! assert!(lamps.has_component(entity));
//! assert!(lamps.store.get(entity).unwrap().lit);
//! ```

#![deny(unsafe_code)]

pub mod entity;
pub mod handle;
pub mod registry;
pub mod store;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity and repository access.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    /// The repository holds no component for this entity.
    #[error("{repository} repository has no component for entity {entity}")]
    ComponentNotFound {
        repository: &'static str,
        entity: entity::EntityId,
    },

    /// The entity id was destroyed (stale generation) or never allocated.
    #[error("entity {entity} does not exist (stale or never allocated)")]
    StaleEntity { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::entity::{EntityAllocator, EntityId};
    pub use crate::handle::{Handle, HandleAllocator};
    pub use crate::registry::EntityRegistry;
    pub use crate::store::{ComponentStore, SimulationRepository};
    pub use crate::EcsError;
}
