//! Systems and the fixed tick that composes them.
//!
//! Each system is a plain function over [`SimulationState`]. [`tick`] runs
//! them in a fixed order every logic step:
//!
//! 1. [`physics_system`]: snapshot previous positions, step the world, apply
//!    gravity, step the world again;
//! 2. [`movement_system`]: sweep characters along their movement intent;
//! 3. [`sensor_system`]: fire immediate sensor commands and rebuild the
//!    available interactions.
//!
//! The world is stepped twice in the physics phase. The first step commits
//! whatever moved since the last tick (teleports, the previous movement
//! sweep); the second commits the gravity sweep, so the sensor phase sees
//! settled positions. Horizontal movement and gravity are separate sweeps.

use lantern_ecs::entity::EntityId;
use lantern_ecs::store::SimulationRepository;
use rapier3d::prelude::ColliderHandle;

use crate::command::QueuedCommand;
use crate::error::SimError;
use crate::event::SimulationEvent;
use crate::sensor::{AvailableInteraction, ExecutionMode, SensorCommandHandle};
use crate::state::SimulationState;

/// Run one logic step.
pub fn tick(state: &mut SimulationState) -> Result<(), SimError> {
    physics_system(state)?;
    movement_system(state)?;
    sensor_system(state)?;
    Ok(())
}

pub fn physics_system(state: &mut SimulationState) -> Result<(), SimError> {
    state.physics.snapshot_previous_positions()?;
    state.transforms.snapshot_previous_positions();

    state.physics.tick_world();
    state.physics.apply_all_gravity(state.delta_time)?;
    state.physics.tick_world();
    Ok(())
}

pub fn movement_system(state: &mut SimulationState) -> Result<(), SimError> {
    let dt = state.delta_time;
    for entity in state.movement.entities() {
        let direction = state.movement.direction(entity)?;
        state.movement.set_previous_direction(entity, direction)?;

        if let Some(delta) = state.movement.desired_delta(entity, dt)? {
            state.physics.try_move_character_controller(entity, delta)?;
        }
    }
    Ok(())
}

pub fn sensor_system(state: &mut SimulationState) -> Result<(), SimError> {
    let sensor_entities = state.sensor_commands.entities();
    for &entity in &sensor_entities {
        state.sensor_commands.clear_available_interactions(entity)?;
    }

    let targets = state.sensor_targets.entities();

    for entity in sensor_entities {
        // No physics component means no sensors.
        if !state.physics.has_component(entity) {
            continue;
        }

        // An unscoped command matches every sensor; it still fires once per tick.
        let mut fired: Vec<SensorCommandHandle> = Vec::new();

        for sensor in state.physics.sensors(entity)? {
            let scoped: Vec<(SensorCommandHandle, ExecutionMode)> = state
                .sensor_commands
                .commands_for_sensor(entity, sensor)?
                .into_iter()
                .filter(|(_, record)| record.enabled)
                .map(|(handle, record)| (handle, record.execution_mode))
                .collect();
            if scoped.is_empty() {
                continue;
            }

            let Some(target) = overlapping_target(state, entity, sensor, &targets)? else {
                continue;
            };

            for (handle, mode) in scoped {
                match mode {
                    ExecutionMode::Immediate => {
                        if fired.contains(&handle) {
                            continue;
                        }
                        fired.push(handle);
                        fire_immediate(state, entity, handle, target)?;
                    }
                    ExecutionMode::Interaction => {
                        state.sensor_commands.push_available_interaction(
                            entity,
                            AvailableInteraction {
                                handle,
                                sensor,
                                target,
                            },
                        )?;
                    }
                }
            }
        }
    }
    Ok(())
}

/// The sensor target overlapping `sensor`. When several overlap, the most
/// recently registered one wins.
fn overlapping_target(
    state: &SimulationState,
    entity: EntityId,
    sensor: ColliderHandle,
    targets: &[EntityId],
) -> Result<Option<EntityId>, SimError> {
    for &target in targets.iter().rev() {
        if !state.physics.has_component(target) {
            continue;
        }
        if state
            .physics
            .is_sensor_colliding_with_target(entity, sensor, target)?
        {
            return Ok(Some(target));
        }
    }
    Ok(None)
}

fn fire_immediate(
    state: &mut SimulationState,
    entity: EntityId,
    handle: SensorCommandHandle,
    target: EntityId,
) -> Result<(), SimError> {
    let record = state.sensor_commands.sensor_command(handle)?;
    let once = record.once;
    state
        .commands
        .push_back(QueuedCommand::triggered(record.command.clone(), target));
    state.events.push(SimulationEvent::SensorCommandFired {
        entity,
        command: handle,
        target,
    });
    if once {
        state.sensor_commands.delete_sensor_command(entity, handle)?;
    }
    Ok(())
}
