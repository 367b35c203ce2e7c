//! Points of interest the UI can point the player at.

use glam::Vec3;
use lantern_ecs::entity::EntityId;
use lantern_ecs::store::ComponentStore;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub const HINT_REPOSITORY: &str = "hint";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintType {
    #[default]
    None,
    /// Something the player should look at.
    Look,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HintComponent {
    pub kind: HintType,
    pub position: Vec3,
}

#[derive(Debug)]
pub struct HintRepository {
    store: ComponentStore<HintComponent>,
}

lantern_ecs::impl_store_repository!(HintRepository);

impl Default for HintRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl HintRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(HINT_REPOSITORY),
        }
    }

    pub fn set_type(&mut self, entity: EntityId, kind: HintType) -> Result<(), SimError> {
        self.store.get_mut(entity)?.kind = kind;
        Ok(())
    }

    pub fn hint_type(&self, entity: EntityId) -> Result<HintType, SimError> {
        Ok(self.store.get(entity)?.kind)
    }

    pub fn set_position(&mut self, entity: EntityId, position: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.position = position;
        Ok(())
    }

    pub fn position(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.position)
    }

    /// Entities whose hint is of `kind`, in insertion order.
    pub fn hints_of_type(&self, kind: HintType) -> Vec<EntityId> {
        self.store
            .iter()
            .filter(|(_, c)| c.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lantern_ecs::store::SimulationRepository;
    use lantern_ecs::EcsError;

    #[test]
    fn hints_of_type_filters_in_order() {
        let mut repo = HintRepository::new();
        let ids: Vec<_> = (0..3).map(|i| EntityId::new(i, 0)).collect();
        for id in &ids {
            repo.create_component(*id);
        }
        repo.set_type(ids[2], HintType::Look).unwrap();
        repo.set_type(ids[0], HintType::Look).unwrap();

        assert_eq!(repo.hints_of_type(HintType::Look), vec![ids[0], ids[2]]);
        assert_eq!(repo.hints_of_type(HintType::None), vec![ids[1]]);
    }

    #[test]
    fn missing_component_fails_like_every_repository() {
        let mut repo = HintRepository::new();
        let err = repo
            .set_position(EntityId::new(7, 0), Vec3::ONE)
            .unwrap_err();
        assert!(matches!(
            err,
            SimError::Ecs(EcsError::ComponentNotFound { repository: HINT_REPOSITORY, .. })
        ));
    }
}
