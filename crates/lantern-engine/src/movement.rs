//! Desired locomotion per entity.
//!
//! The movement repository only stores intent: a direction, a speed and
//! whether vertical input is ignored. The movement system turns that intent
//! into character-controller sweeps. The previous tick's direction is kept so
//! animation views can react to start/stop edges.

use glam::Vec3;
use lantern_ecs::entity::EntityId;
use lantern_ecs::store::ComponentStore;

use crate::error::SimError;

pub const MOVEMENT_REPOSITORY: &str = "movement";

/// Locomotion intent of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementComponent {
    /// Not normalized; the movement system normalizes before use.
    pub direction: Vec3,
    pub previous_direction: Vec3,
    /// Units per second.
    pub speed: f32,
    /// Drop the Y component of `direction` before moving.
    pub lock_vertical: bool,
}

#[derive(Debug)]
pub struct MovementRepository {
    store: ComponentStore<MovementComponent>,
}

lantern_ecs::impl_store_repository!(MovementRepository);

impl Default for MovementRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MovementRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(MOVEMENT_REPOSITORY),
        }
    }

    pub fn component(&self, entity: EntityId) -> Result<&MovementComponent, SimError> {
        Ok(self.store.get(entity)?)
    }

    pub fn direction(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.direction)
    }

    pub fn set_direction(&mut self, entity: EntityId, direction: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.direction = direction;
        Ok(())
    }

    pub fn previous_direction(&self, entity: EntityId) -> Result<Vec3, SimError> {
        Ok(self.store.get(entity)?.previous_direction)
    }

    pub fn set_previous_direction(&mut self, entity: EntityId, direction: Vec3) -> Result<(), SimError> {
        self.store.get_mut(entity)?.previous_direction = direction;
        Ok(())
    }

    pub fn speed(&self, entity: EntityId) -> Result<f32, SimError> {
        Ok(self.store.get(entity)?.speed)
    }

    pub fn set_speed(&mut self, entity: EntityId, speed: f32) -> Result<(), SimError> {
        self.store.get_mut(entity)?.speed = speed;
        Ok(())
    }

    pub fn lock_vertical(&self, entity: EntityId) -> Result<bool, SimError> {
        Ok(self.store.get(entity)?.lock_vertical)
    }

    pub fn set_lock_vertical(&mut self, entity: EntityId, lock: bool) -> Result<(), SimError> {
        self.store.get_mut(entity)?.lock_vertical = lock;
        Ok(())
    }

    /// Whether the entity currently has a nonzero direction.
    pub fn is_moving(&self, entity: EntityId) -> Result<bool, SimError> {
        Ok(self.store.get(entity)?.direction != Vec3::ZERO)
    }

    /// Rising edge: still last tick, moving now.
    pub fn started_moving(&self, entity: EntityId) -> Result<bool, SimError> {
        let c = self.store.get(entity)?;
        Ok(c.previous_direction == Vec3::ZERO && c.direction != Vec3::ZERO)
    }

    /// Falling edge: moving last tick, still now.
    pub fn stopped_moving(&self, entity: EntityId) -> Result<bool, SimError> {
        let c = self.store.get(entity)?;
        Ok(c.previous_direction != Vec3::ZERO && c.direction == Vec3::ZERO)
    }

    /// The displacement this entity should attempt over `dt` seconds, or
    /// `None` when it is not moving.
    pub fn desired_delta(&self, entity: EntityId, dt: f32) -> Result<Option<Vec3>, SimError> {
        let c = self.store.get(entity)?;
        if c.speed <= 0.0 || c.direction == Vec3::ZERO {
            return Ok(None);
        }
        let mut direction = c.direction.normalize_or_zero();
        if c.lock_vertical {
            direction.y = 0.0;
            direction = direction.normalize_or_zero();
        }
        if direction == Vec3::ZERO {
            return Ok(None);
        }
        Ok(Some(direction * c.speed * dt))
    }
}
