//! Commands queued on the simulation and executed at the start of a tick.
//!
//! Commands are a closed set: every kind the engine knows how to execute is a
//! [`SimulationCommand`] variant. Scene-specific behavior that does not fit a
//! built-in variant goes through [`SimulationCommand::Script`], a named
//! closure with full access to the [`Simulation`].
//!
//! A command can address the entity that *triggered* it instead of a fixed
//! id. Sensor commands are authored before the player exists, so they use
//! [`CommandTarget::Trigger`]; the sensor system fills in the overlapping
//! target when it queues the command.

use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use lantern_ecs::entity::EntityId;
use lantern_ecs::store::SimulationRepository;
use tracing::info;

use crate::error::SimError;
use crate::event::SimulationEvent;
use crate::sensor::SensorCommandHandle;
use crate::simulation::Simulation;
use crate::stats::StatusEffectHandle;

// ---------------------------------------------------------------------------
// CommandTarget
// ---------------------------------------------------------------------------

/// Which entity an entity-bearing command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTarget {
    Entity(EntityId),
    /// The sensor target whose overlap queued the command.
    Trigger,
}

impl CommandTarget {
    fn resolve(self, trigger: Option<EntityId>, command: &str) -> Result<EntityId, SimError> {
        match self {
            Self::Entity(entity) => Ok(entity),
            Self::Trigger => trigger.ok_or_else(|| SimError::NoTrigger {
                command: command.to_owned(),
            }),
        }
    }
}

impl From<EntityId> for CommandTarget {
    fn from(entity: EntityId) -> Self {
        Self::Entity(entity)
    }
}

// ---------------------------------------------------------------------------
// ScriptCommand
// ---------------------------------------------------------------------------

type ScriptFn = dyn Fn(&mut Simulation, Option<EntityId>) -> anyhow::Result<()>;

/// A named closure run as a command. The second argument is the triggering
/// entity, if the command was queued by a sensor or an interaction.
#[derive(Clone)]
pub struct ScriptCommand {
    name: String,
    run: Rc<ScriptFn>,
}

impl ScriptCommand {
    pub fn new(
        name: impl Into<String>,
        run: impl Fn(&mut Simulation, Option<EntityId>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            run: Rc::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptCommand")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// SimulationCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum SimulationCommand {
    Log { message: String },
    /// Move an entity without sweeping. Physics entities move their body,
    /// others their transform. Interpolation restarts at the new position.
    Teleport { target: CommandTarget, position: Vec3 },
    SetDirection { target: CommandTarget, direction: Vec3 },
    SetSpeed { target: CommandTarget, speed: f32 },
    SetSensorCommandEnabled {
        handle: SensorCommandHandle,
        enabled: bool,
    },
    RemoveStatusEffect {
        target: CommandTarget,
        handle: StatusEffectHandle,
    },
    /// Destroy the entity: views, every repository, then its id.
    Destroy { target: CommandTarget },
    Emit(SimulationEvent),
    Script(ScriptCommand),
}

impl SimulationCommand {
    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
        }
    }

    pub fn script(
        name: impl Into<String>,
        run: impl Fn(&mut Simulation, Option<EntityId>) -> anyhow::Result<()> + 'static,
    ) -> Self {
        Self::Script(ScriptCommand::new(name, run))
    }

    /// Short name used in logs and [`SimulationEvent::CommandFailed`].
    pub fn name(&self) -> &str {
        match self {
            Self::Log { .. } => "log",
            Self::Teleport { .. } => "teleport",
            Self::SetDirection { .. } => "set_direction",
            Self::SetSpeed { .. } => "set_speed",
            Self::SetSensorCommandEnabled { .. } => "set_sensor_command_enabled",
            Self::RemoveStatusEffect { .. } => "remove_status_effect",
            Self::Destroy { .. } => "destroy",
            Self::Emit(_) => "emit",
            Self::Script(script) => script.name(),
        }
    }
}

// ---------------------------------------------------------------------------
// QueuedCommand
// ---------------------------------------------------------------------------

/// A command waiting in the queue, with the entity that triggered it.
#[derive(Debug, Clone)]
pub struct QueuedCommand {
    pub command: SimulationCommand,
    pub trigger: Option<EntityId>,
}

impl QueuedCommand {
    pub fn new(command: SimulationCommand) -> Self {
        Self {
            command,
            trigger: None,
        }
    }

    pub fn triggered(command: SimulationCommand, trigger: EntityId) -> Self {
        Self {
            command,
            trigger: Some(trigger),
        }
    }

    pub fn name(&self) -> &str {
        self.command.name()
    }

    pub(crate) fn execute(self, simulation: &mut Simulation) -> Result<(), SimError> {
        let trigger = self.trigger;
        let name = self.command.name().to_owned();

        match self.command {
            SimulationCommand::Log { message } => {
                info!(trigger = ?trigger, "{message}");
            }
            SimulationCommand::Teleport { target, position } => {
                let entity = target.resolve(trigger, &name)?;
                let state = simulation.state_mut();
                if state.physics.has_component(entity) {
                    state.physics.set_position(entity, position)?;
                    state.physics.set_previous_position(entity, position)?;
                } else {
                    state.transforms.set_position(entity, position)?;
                    state.transforms.set_previous_position(entity, position)?;
                }
            }
            SimulationCommand::SetDirection { target, direction } => {
                let entity = target.resolve(trigger, &name)?;
                simulation
                    .state_mut()
                    .movement
                    .set_direction(entity, direction)?;
            }
            SimulationCommand::SetSpeed { target, speed } => {
                let entity = target.resolve(trigger, &name)?;
                simulation.state_mut().movement.set_speed(entity, speed)?;
            }
            SimulationCommand::SetSensorCommandEnabled { handle, enabled } => {
                simulation
                    .state_mut()
                    .sensor_commands
                    .set_enabled(handle, enabled)?;
            }
            SimulationCommand::RemoveStatusEffect { target, handle } => {
                let entity = target.resolve(trigger, &name)?;
                simulation
                    .state_mut()
                    .stats
                    .remove_status_effect(entity, handle)?;
            }
            SimulationCommand::Destroy { target } => {
                let entity = target.resolve(trigger, &name)?;
                simulation.destroy_entity(entity);
            }
            SimulationCommand::Emit(event) => {
                simulation.state_mut().events.push(event);
            }
            SimulationCommand::Script(script) => {
                (script.run)(simulation, trigger).map_err(|source| SimError::Script {
                    name: script.name.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }
}
