//! Base stats and revocable status-effect modifiers.
//!
//! A stat's computed value is its base value folded through every modifier
//! targeting that stat, in the order the modifiers were created:
//!
//! ```
//! use lantern_ecs::prelude::*;
//! use lantern_engine::stats::{Modifier, StatRepository, StatType};
//!
//! let mut stats = StatRepository::new();
//! let hero = EntityId::new(0, 0);
//! stats.create_component(hero);
//! stats.set_stat_base_value(hero, StatType::Speed, 10.0).unwrap();
//!
//! let boots = stats.create_status_effect(hero, Modifier::add(StatType::Speed, 5.0)).unwrap();
//! stats.create_status_effect(hero, Modifier::multiply(StatType::Speed, 2.0)).unwrap();
//! assert_eq!(stats.stat_computed_value(hero, StatType::Speed).unwrap(), 30.0);
//!
//! stats.remove_status_effect(hero, boots).unwrap();
//! assert_eq!(stats.stat_computed_value(hero, StatType::Speed).unwrap(), 20.0);
//! ```

use std::collections::HashMap;

use lantern_ecs::entity::EntityId;
use lantern_ecs::handle::{Handle, HandleAllocator};
use lantern_ecs::store::ComponentStore;
use serde::{Deserialize, Serialize};

use crate::error::SimError;

pub const STAT_REPOSITORY: &str = "stat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatType {
    Speed,
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierType {
    Add,
    Multiply,
}

/// One stat change carried by a status effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub kind: ModifierType,
    pub stat: StatType,
    pub value: f32,
}

impl Modifier {
    pub fn add(stat: StatType, value: f32) -> Self {
        Self {
            kind: ModifierType::Add,
            stat,
            value,
        }
    }

    pub fn multiply(stat: StatType, value: f32) -> Self {
        Self {
            kind: ModifierType::Multiply,
            stat,
            value,
        }
    }

    fn apply(&self, value: f32) -> f32 {
        match self.kind {
            ModifierType::Add => value + self.value,
            ModifierType::Multiply => value * self.value,
        }
    }
}

/// Marker for [`StatusEffectHandle`].
pub enum StatusEffect {}

/// Revocation handle returned by [`StatRepository::create_status_effect`].
pub type StatusEffectHandle = Handle<StatusEffect>;

#[derive(Debug, Default)]
pub struct StatComponent {
    base: HashMap<StatType, f32>,
    modifiers: Vec<(StatusEffectHandle, Modifier)>,
}

#[derive(Debug)]
pub struct StatRepository {
    store: ComponentStore<StatComponent>,
    handles: HandleAllocator<StatusEffect>,
}

lantern_ecs::impl_store_repository!(StatRepository);

impl Default for StatRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl StatRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(STAT_REPOSITORY),
            handles: HandleAllocator::new(),
        }
    }

    pub fn set_stat_base_value(&mut self, entity: EntityId, stat: StatType, value: f32) -> Result<(), SimError> {
        self.store.get_mut(entity)?.base.insert(stat, value);
        Ok(())
    }

    /// Base value of `stat`; zero when it was never set.
    pub fn stat_base_value(&self, entity: EntityId, stat: StatType) -> Result<f32, SimError> {
        Ok(self
            .store
            .get(entity)?
            .base
            .get(&stat)
            .copied()
            .unwrap_or(0.0))
    }

    /// Register a modifier and return the handle that revokes it.
    pub fn create_status_effect(
        &mut self,
        entity: EntityId,
        modifier: Modifier,
    ) -> Result<StatusEffectHandle, SimError> {
        let component = self.store.get_mut(entity)?;
        let handle = self.handles.next();
        component.modifiers.push((handle, modifier));
        Ok(handle)
    }

    /// Revoke a modifier. Unknown or already removed handles are ignored.
    pub fn remove_status_effect(&mut self, entity: EntityId, handle: StatusEffectHandle) -> Result<(), SimError> {
        self.store
            .get_mut(entity)?
            .modifiers
            .retain(|(h, _)| *h != handle);
        Ok(())
    }

    /// Active modifiers in creation order.
    pub fn status_effects(&self, entity: EntityId) -> Result<&[(StatusEffectHandle, Modifier)], SimError> {
        Ok(&self.store.get(entity)?.modifiers)
    }

    /// Base value folded through the matching modifiers in creation order.
    ///
    /// Add and multiply are not regrouped: a multiply created before an add
    /// scales only the base.
    pub fn stat_computed_value(&self, entity: EntityId, stat: StatType) -> Result<f32, SimError> {
        let component = self.store.get(entity)?;
        let base = component.base.get(&stat).copied().unwrap_or(0.0);
        Ok(component
            .modifiers
            .iter()
            .filter(|(_, m)| m.stat == stat)
            .fold(base, |value, (_, m)| m.apply(value)))
    }
}
