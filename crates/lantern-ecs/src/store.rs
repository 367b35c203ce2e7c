//! Sparse per-aspect component storage and the repository contract.
//!
//! Every aspect of an entity (physics, movement, stats, ...) lives in its own
//! repository. A repository owns a [`ComponentStore`] mapping entity ids to
//! one component value each, and exposes the operations that are valid on
//! that aspect. Membership in a store is what it means for an entity to
//! "have" the aspect.

use std::collections::HashMap;

use crate::entity::EntityId;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentStore
// ---------------------------------------------------------------------------

/// Insertion-ordered sparse map from [`EntityId`] to a component value.
///
/// Lookups are O(1). Iteration follows insertion order so that systems run
/// over entities in the order scene code created their components.
#[derive(Debug, Clone)]
pub struct ComponentStore<T> {
    name: &'static str,
    components: HashMap<EntityId, T>,
    order: Vec<EntityId>,
}

impl<T> ComponentStore<T> {
    /// An empty store. `name` identifies the aspect in error messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            components: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// The aspect name given at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert `value` for `entity`.
    ///
    /// A second insert for the same entity overwrites the value in place and
    /// keeps the entity's existing iteration position.
    pub fn insert(&mut self, entity: EntityId, value: T) {
        if self.components.insert(entity, value).is_none() {
            self.order.push(entity);
        }
    }

    /// Remove and return the value for `entity`, if any.
    pub fn remove(&mut self, entity: EntityId) -> Option<T> {
        let removed = self.components.remove(&entity)?;
        if let Some(pos) = self.order.iter().position(|&e| e == entity) {
            self.order.remove(pos);
        }
        Some(removed)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.components.contains_key(&entity)
    }

    /// Shared access, failing with [`EcsError::ComponentNotFound`].
    pub fn get(&self, entity: EntityId) -> Result<&T, EcsError> {
        self.components
            .get(&entity)
            .ok_or(EcsError::ComponentNotFound {
                repository: self.name,
                entity,
            })
    }

    /// Exclusive access, failing with [`EcsError::ComponentNotFound`].
    pub fn get_mut(&mut self, entity: EntityId) -> Result<&mut T, EcsError> {
        let name = self.name;
        self.components
            .get_mut(&entity)
            .ok_or(EcsError::ComponentNotFound {
                repository: name,
                entity,
            })
    }

    /// Entity ids in insertion order.
    pub fn ids(&self) -> &[EntityId] {
        &self.order
    }

    /// `(id, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.components.get(id).map(|c| (*id, c)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every component.
    pub fn clear(&mut self) {
        self.components.clear();
        self.order.clear();
    }
}

// ---------------------------------------------------------------------------
// SimulationRepository
// ---------------------------------------------------------------------------

/// Uniform lifecycle contract shared by every repository.
///
/// Repositories with external resources (the physics repository owns bodies
/// and colliders in the physics world) override
/// [`remove_component`](Self::remove_component) to release them.
pub trait SimulationRepository {
    /// Insert a default component for `entity`, overwriting any existing one.
    fn create_component(&mut self, entity: EntityId);

    /// Remove `entity`'s component. Removing an absent component is a no-op.
    fn remove_component(&mut self, entity: EntityId);

    /// O(1) membership check.
    fn has_component(&self, entity: EntityId) -> bool;

    /// Snapshot of member ids in insertion order.
    ///
    /// A snapshot (not a borrow) so systems may change membership while
    /// walking it.
    fn entities(&self) -> Vec<EntityId>;
}

/// Implement [`SimulationRepository`] for a repository whose components are
/// plain data in a `store` field of type `ComponentStore<C>` with
/// `C: Default`.
#[macro_export]
macro_rules! impl_store_repository {
    ($repo:ty) => {
        impl $crate::store::SimulationRepository for $repo {
            fn create_component(&mut self, entity: $crate::entity::EntityId) {
                self.store.insert(entity, Default::default());
            }

            fn remove_component(&mut self, entity: $crate::entity::EntityId) {
                self.store.remove(entity);
            }

            fn has_component(&self, entity: $crate::entity::EntityId) -> bool {
                self.store.contains(entity)
            }

            fn entities(&self) -> Vec<$crate::entity::EntityId> {
                self.store.ids().to_vec()
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
