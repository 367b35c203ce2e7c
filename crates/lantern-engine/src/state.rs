//! All repositories of one simulation plus its command and event queues.

use std::collections::VecDeque;

use lantern_ecs::entity::EntityId;
use lantern_ecs::store::SimulationRepository;
use tracing::debug;

use crate::command::{QueuedCommand, SimulationCommand};
use crate::config::SimulationConfig;
use crate::event::SimulationEvent;
use crate::hint::HintRepository;
use crate::movement::MovementRepository;
use crate::physics::PhysicsRepository;
use crate::sensor::{SensorCommandRepository, SensorTargetRepository};
use crate::stats::StatRepository;
use crate::transform::TransformRepository;

/// Mutable state of one simulation instance.
///
/// Systems receive the whole state so they can read one repository while
/// writing another. Repository fields are public for the same reason; entity
/// factories populate them directly.
pub struct SimulationState {
    /// Seconds simulated by the current tick.
    pub delta_time: f32,

    pub physics: PhysicsRepository,
    pub movement: MovementRepository,
    pub stats: StatRepository,
    pub sensor_commands: SensorCommandRepository,
    pub sensor_targets: SensorTargetRepository,
    pub transforms: TransformRepository,
    pub hints: HintRepository,

    /// Commands executed at the start of the next tick, FIFO.
    pub commands: VecDeque<QueuedCommand>,
    /// Events for game code, oldest first.
    pub events: Vec<SimulationEvent>,
}

impl SimulationState {
    pub fn new(config: &SimulationConfig) -> Self {
        let step = config.game_loop.step_seconds();
        Self {
            delta_time: step,
            physics: PhysicsRepository::new(config.physics.clone(), step),
            movement: MovementRepository::new(),
            stats: StatRepository::new(),
            sensor_commands: SensorCommandRepository::new(),
            sensor_targets: SensorTargetRepository::new(),
            transforms: TransformRepository::new(),
            hints: HintRepository::new(),
            commands: VecDeque::new(),
            events: Vec::new(),
        }
    }

    /// Queue a command with no trigger.
    pub fn enqueue(&mut self, command: SimulationCommand) {
        self.commands.push_back(QueuedCommand::new(command));
    }

    /// Remove `entity` from every repository. Idempotent.
    pub fn destroy(&mut self, entity: EntityId) {
        self.physics.remove_component(entity);
        self.movement.remove_component(entity);
        self.stats.remove_component(entity);
        self.sensor_commands.remove_component(entity);
        self.sensor_targets.remove_component(entity);
        self.transforms.remove_component(entity);
        self.hints.remove_component(entity);
        debug!(entity = %entity, "entity removed from all repositories");
    }

    /// Take every pending event.
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(&SimulationConfig::default())
    }
}
