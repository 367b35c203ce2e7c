//! The entity registry: the single source of entity ids for one simulation.

use tracing::debug;

use crate::entity::{EntityAllocator, EntityId};

/// Issues unique entity ids.
///
/// The registry stores no component data. Whether an entity "exists" in any
/// meaningful sense is decided by which repositories hold a component for it;
/// the registry only guarantees uniqueness and stale-id detection once an id
/// has been destroyed.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    allocator: EntityAllocator,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id. Never fails.
    pub fn create(&mut self) -> EntityId {
        let id = self.allocator.allocate();
        debug!(entity = %id, "entity created");
        id
    }

    /// Release `id` so its slot can be recycled under a new generation.
    ///
    /// Callers must remove the entity's components from every repository
    /// first; the registry does not know about them. Returns `false` for an
    /// id that was already destroyed.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        let freed = self.allocator.deallocate(id);
        if freed {
            debug!(entity = %id, "entity destroyed");
        }
        freed
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    pub fn alive_count(&self) -> usize {
        self.allocator.alive_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_returns_distinct_ids() {
        let mut registry = EntityRegistry::new();
        let a = registry.create();
        let b = registry.create();
        assert_ne!(a, b);
        assert_eq!(registry.alive_count(), 2);
    }

    #[test]
    fn destroyed_id_is_never_reissued() {
        let mut registry = EntityRegistry::new();
        let old = registry.create();
        assert!(registry.destroy(old));
        let new = registry.create();
        assert_ne!(old, new);
        assert!(!registry.is_alive(old));
        assert!(registry.is_alive(new));
    }
}
