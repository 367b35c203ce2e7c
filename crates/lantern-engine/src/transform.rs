//! Presentation transforms for entities without a physics body.

use glam::Vec3;
use lantern_ecs::entity::EntityId;
use lantern_ecs::store::ComponentStore;

use crate::error::SimError;

pub const TRANSFORM_REPOSITORY: &str = "transform";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformComponent {
    pub position: Vec3,
    pub previous_position: Vec3,
}

#[derive(Debug)]
pub struct TransformRepository {
    store: ComponentStore<TransformComponent>,
}

lantern_ecs::impl_store_repository!(TransformRepository);

impl Default for TransformRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(TRANSFORM_REPOSITORY),
        }
    }

    pub fn position(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.position)
    }

    pub fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.position = position;
        Ok(())
    }

    pub fn previous_position(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.previous_position)
    }

    pub fn set_previous_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.previous_position = position;
        Ok(())
    }

    pub fn interpolated_position(&self, entity: EntityId, lerp: f32) -> Result<Vec3, SimError> {
        let c = self.store.get(entity)?;
        Ok(c.previous_position.lerp(c.position, lerp))
    }

    /// Copy every current position into the previous slot.
    pub fn snapshot_previous_positions(&mut self) {
        for entity in self.store.ids().to_vec() {
            if let Ok(c) = self.store.get_mut(entity) {
                c.previous_position = c.position;
            }
        }
    }
}
