//! Sensor commands and sensor targets.
//!
//! A sensor command binds a [`SimulationCommand`] to an entity's sensor
//! colliders. When a sensor *target* (usually the player) overlaps one of
//! those sensors, the sensor system either queues the command right away
//! ([`ExecutionMode::Immediate`]) or lists it as an interaction the player may
//! trigger ([`ExecutionMode::Interaction`]).
//!
//! ```
//! use lantern_ecs::prelude::*;
//! use lantern_engine::command::SimulationCommand;
//! use lantern_engine::sensor::{SensorCommandRepository, SensorCommandSpec};
//!
//! let mut sensors = SensorCommandRepository::new();
//! let fridge = EntityId::new(0, 0);
//! sensors.create_component(fridge);
//!
//! let open = sensors
//!     .add_sensor_command(
//!         SensorCommandSpec::interaction(fridge, SimulationCommand::log("fridge opened"))
//!             .once()
//!             .with_owner("Fridge"),
//!     )
//!     .unwrap();
//! assert_eq!(sensors.sensor_commands(fridge).unwrap(), &[open]);
//! ```

use std::collections::HashMap;

use glam::Vec3;
use lantern_ecs::entity::EntityId;
use lantern_ecs::handle::{Handle, HandleAllocator};
use lantern_ecs::store::{ComponentStore, SimulationRepository};
use rapier3d::prelude::ColliderHandle;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::command::{QueuedCommand, SimulationCommand};
use crate::error::SimError;
use crate::math::angle_between;
use crate::physics::PhysicsRepository;

pub const SENSOR_COMMAND_REPOSITORY: &str = "sensor_command";
pub const SENSOR_TARGET_REPOSITORY: &str = "sensor_target";

/// Marker for [`SensorCommandHandle`].
pub enum SensorCommandTag {}

pub type SensorCommandHandle = Handle<SensorCommandTag>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Queue the command as soon as a target overlaps the sensor.
    Immediate,
    /// Offer the command to the player while a target overlaps the sensor.
    Interaction,
}

/// One command bound to an entity's sensors.
#[derive(Debug, Clone)]
pub struct SensorCommand {
    pub command: SimulationCommand,
    pub execution_mode: ExecutionMode,
    /// Sensors this command listens on; `None` means every sensor of the
    /// owning entity.
    pub sensors: Option<Vec<ColliderHandle>>,
    /// Delete after the first dispatch or trigger.
    pub once: bool,
    pub enabled: bool,
    /// Scene object to highlight while the interaction is available.
    pub owner: Option<String>,
}

impl SensorCommand {
    pub fn listens_on(&self, sensor: ColliderHandle) -> bool {
        self.sensors
            .as_ref()
            .map_or(true, |sensors| sensors.contains(&sensor))
    }
}

/// Builder accepted by [`SensorCommandRepository::add_sensor_command`].
#[derive(Debug, Clone)]
pub struct SensorCommandSpec {
    pub entity: EntityId,
    pub command: SimulationCommand,
    pub execution_mode: ExecutionMode,
    pub sensors: Option<Vec<ColliderHandle>>,
    pub once: bool,
    pub owner: Option<String>,
}

impl SensorCommandSpec {
    pub fn immediate(entity: EntityId, command: SimulationCommand) -> Self {
        Self::new(entity, command, ExecutionMode::Immediate)
    }

    pub fn interaction(entity: EntityId, command: SimulationCommand) -> Self {
        Self::new(entity, command, ExecutionMode::Interaction)
    }

    fn new(entity: EntityId, command: SimulationCommand, execution_mode: ExecutionMode) -> Self {
        Self {
            entity,
            command,
            execution_mode,
            sensors: None,
            once: false,
            owner: None,
        }
    }

    pub fn with_sensors(mut self, sensors: impl IntoIterator<Item = ColliderHandle>) -> Self {
        self.sensors = Some(sensors.into_iter().collect());
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// An interaction a target may trigger this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailableInteraction {
    pub handle: SensorCommandHandle,
    /// Sensor collider the target overlaps.
    pub sensor: ColliderHandle,
    pub target: EntityId,
}

// ---------------------------------------------------------------------------
// SensorCommandRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct SensorCommandComponent {
    commands: Vec<SensorCommandHandle>,
    available: Vec<AvailableInteraction>,
}

/// Per-entity command lists plus the handle-keyed table of command records.
#[derive(Debug)]
pub struct SensorCommandRepository {
    store: ComponentStore<SensorCommandComponent>,
    records: HashMap<SensorCommandHandle, SensorCommand>,
    handles: HandleAllocator<SensorCommandTag>,
}

impl Default for SensorCommandRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorCommandRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(SENSOR_COMMAND_REPOSITORY),
            records: HashMap::new(),
            handles: HandleAllocator::new(),
        }
    }

    /// Register a command on `request.entity`. New commands start enabled.
    pub fn add_sensor_command(&mut self, request: SensorCommandSpec) -> Result<SensorCommandHandle, SimError> {
        let component = self.store.get_mut(request.entity)?;
        let handle = self.handles.next();
        component.commands.push(handle);
        self.records.insert(
            handle,
            SensorCommand {
                command: request.command,
                execution_mode: request.execution_mode,
                sensors: request.sensors,
                once: request.once,
                enabled: true,
                owner: request.owner,
            },
        );
        debug!(entity = %request.entity, ?handle, mode = ?request.execution_mode, "sensor command added");
        Ok(handle)
    }

    /// Remove a command and any availability it had this tick. Deleting an
    /// unknown handle is a no-op.
    pub fn delete_sensor_command(&mut self, entity: EntityId, handle: SensorCommandHandle) -> Result<(), SimError> {
        let component = self.store.get_mut(entity)?;
        let owned = component.commands.contains(&handle);
        component.commands.retain(|h| *h != handle);
        component.available.retain(|a| a.handle != handle);
        if owned {
            self.records.remove(&handle);
        }
        Ok(())
    }

    pub fn sensor_command(&self, handle: SensorCommandHandle) -> Result<&SensorCommand, SimError> {
        self.records
            .get(&handle)
            .ok_or(SimError::UnknownSensorCommand { handle })
    }

    /// Enable or disable a command. Disabled commands neither fire nor become
    /// available.
    pub fn set_enabled(&mut self, handle: SensorCommandHandle, enabled: bool) -> Result<(), SimError> {
        self.records
            .get_mut(&handle)
            .ok_or(SimError::UnknownSensorCommand { handle })?
            .enabled = enabled;
        Ok(())
    }

    /// Handles registered on `entity`, in registration order.
    pub fn sensor_commands(&self, entity: EntityId) -> Result<&[SensorCommandHandle], SimError> {
        Ok(&self.store.get(entity)?.commands)
    }

    /// Commands of `entity` that listen on `sensor`, enabled or not.
    pub fn commands_for_sensor(
        &self,
        entity: EntityId,
        sensor: ColliderHandle,
    ) -> Result<Vec<(SensorCommandHandle, &SensorCommand)>, SimError> {
        Ok(self
            .store
            .get(entity)?
            .commands
            .iter()
            .filter_map(|h| self.records.get(h).map(|record| (*h, record)))
            .filter(|(_, record)| record.listens_on(sensor))
            .collect())
    }

    pub fn clear_available_interactions(&mut self, entity: EntityId) -> Result<(), SimError> {
        self.store.get_mut(entity)?.available.clear();
        Ok(())
    }

    /// Replace the entity's available interactions.
    pub fn set_available_interactions(
        &mut self,
        entity: EntityId,
        interactions: Vec<AvailableInteraction>,
    ) -> Result<(), SimError> {
        self.store.get_mut(entity)?.available = interactions;
        Ok(())
    }

    /// Add an interaction unless the same command is already available.
    pub fn push_available_interaction(
        &mut self,
        entity: EntityId,
        interaction: AvailableInteraction,
    ) -> Result<(), SimError> {
        let available = &mut self.store.get_mut(entity)?.available;
        if !available.iter().any(|a| a.handle == interaction.handle) {
            available.push(interaction);
        }
        Ok(())
    }

    pub fn available_interactions(&self, entity: EntityId) -> Result<&[AvailableInteraction], SimError> {
        Ok(&self.store.get(entity)?.available)
    }

    /// Every available interaction with the entity that owns it.
    pub fn all_available_interactions(&self) -> Vec<(EntityId, AvailableInteraction)> {
        self.store
            .iter()
            .flat_map(|(entity, c)| c.available.iter().map(move |a| (entity, *a)))
            .collect()
    }

    /// Interactions `target` is currently able to trigger.
    pub fn available_interactions_for_target(&self, target: EntityId) -> Vec<(EntityId, AvailableInteraction)> {
        self.all_available_interactions()
            .into_iter()
            .filter(|(_, a)| a.target == target)
            .collect()
    }

    /// Consume an available interaction and return the command to queue,
    /// addressed to the interacting target. `once` commands are deleted.
    pub fn trigger_interaction(
        &mut self,
        entity: EntityId,
        handle: SensorCommandHandle,
    ) -> Result<(QueuedCommand, AvailableInteraction), SimError> {
        let interaction = self
            .store
            .get(entity)?
            .available
            .iter()
            .find(|a| a.handle == handle)
            .copied()
            .ok_or(SimError::InteractionUnavailable { entity, handle })?;
        let record = self.sensor_command(handle)?;
        if !record.enabled {
            return Err(SimError::InteractionUnavailable { entity, handle });
        }

        let once = record.once;
        let queued = QueuedCommand::triggered(record.command.clone(), interaction.target);
        if once {
            self.delete_sensor_command(entity, handle)?;
        } else {
            self.store
                .get_mut(entity)?
                .available
                .retain(|a| a.handle != handle);
        }
        Ok((queued, interaction))
    }

    /// The available interaction whose sensor sits at the smallest angle from
    /// `forward` as seen from `viewer`. Ties go to the earliest registered.
    pub fn closest_interaction(
        &self,
        physics: &PhysicsRepository,
        viewer: Vec3,
        forward: Vec3,
    ) -> Option<(EntityId, AvailableInteraction)> {
        self.all_available_interactions()
            .into_iter()
            .filter_map(|(entity, interaction)| {
                let position = physics.collider_position(interaction.sensor).ok()?;
                let angle = angle_between(position - viewer, forward);
                Some((angle, entity, interaction))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, entity, interaction)| (entity, interaction))
    }
}

impl SimulationRepository for SensorCommandRepository {
    fn create_component(&mut self, entity: EntityId) {
        if let Some(old) = self.store.remove(entity) {
            for handle in old.commands {
                self.records.remove(&handle);
            }
        }
        self.store.insert(entity, SensorCommandComponent::default());
    }

    /// Also drops the entity's command records.
    fn remove_component(&mut self, entity: EntityId) {
        if let Some(component) = self.store.remove(entity) {
            for handle in component.commands {
                self.records.remove(&handle);
            }
        }
    }

    fn has_component(&self, entity: EntityId) -> bool {
        self.store.contains(entity)
    }

    fn entities(&self) -> Vec<EntityId> {
        self.store.ids().to_vec()
    }
}

// ---------------------------------------------------------------------------
// SensorTargetRepository
// ---------------------------------------------------------------------------

/// Marks an entity whose primary collider can set off sensors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorTargetComponent;

#[derive(Debug)]
pub struct SensorTargetRepository {
    store: ComponentStore<SensorTargetComponent>,
}

lantern_ecs::impl_store_repository!(SensorTargetRepository);

impl Default for SensorTargetRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorTargetRepository {
    pub fn new() -> Self {
        Self {
            store: ComponentStore::new(SENSOR_TARGET_REPOSITORY),
        }
    }
}
