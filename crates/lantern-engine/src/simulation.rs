//! Top-level container: registry, state, views and the loop clock.
//!
//! The host owns a [`Simulation`] and calls [`Simulation::frame`] from its
//! per-frame callback. Each frame:
//!
//! 1. the [`GameLoop`] turns elapsed real time into zero or more logic steps;
//! 2. each step runs [`Simulation::update_game_logic`]: set the step's delta
//!    time, drain the command queue, run [`tick`], then run the views'
//!    fixed-step `update`;
//! 3. the views `draw` once with the interpolation factor.
//!
//! # Command drain
//!
//! The queue is drained to a fixed point: commands queued while draining run
//! in the same pass. A cascade is capped at
//! [`CommandConfig::max_drain_per_tick`](crate::config::CommandConfig::max_drain_per_tick)
//! commands per step; the rest wait for the next step. A command that fails
//! is logged and reported as [`SimulationEvent::CommandFailed`], and the
//! drain continues.

use std::time::Instant;

use lantern_ecs::entity::EntityId;
use lantern_ecs::registry::EntityRegistry;
use tracing::{error, info, warn};

use crate::command::{QueuedCommand, SimulationCommand};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::event::SimulationEvent;
use crate::game_loop::{FrameSteps, GameLoop};
use crate::loading::{AssetSlot, CancellationToken};
use crate::sensor::SensorCommandHandle;
use crate::state::SimulationState;
use crate::systems::tick;
use crate::view::{FrameContext, View, ViewContext, ViewKey, ViewSync, Viewport};

pub struct Simulation {
    config: SimulationConfig,
    entities: EntityRegistry,
    state: SimulationState,
    views: ViewSync,
    frame: FrameContext,
    game_loop: GameLoop,
    scene_token: CancellationToken,
    clock: Instant,
    started_ms: f64,
    ticks: u64,
}

/// Build a [`ViewContext`] from disjoint fields of a [`Simulation`].
macro_rules! view_ctx {
    ($sim:expr) => {
        &mut ViewContext {
            state: &mut $sim.state,
            entities: &$sim.entities,
            frame: &$sim.frame,
        }
    };
}

impl Simulation {
    /// A stopped simulation with empty repositories.
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            entities: EntityRegistry::new(),
            state: SimulationState::new(&config),
            views: ViewSync::new(),
            frame: FrameContext::default(),
            game_loop: GameLoop::new(config.game_loop.clone()),
            scene_token: CancellationToken::new(),
            clock: Instant::now(),
            started_ms: 0.0,
            ticks: 0,
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    pub fn frame_context(&self) -> &FrameContext {
        &self.frame
    }

    /// Mutable frame data, for the host to write input into.
    pub fn frame_context_mut(&mut self) -> &mut FrameContext {
        &mut self.frame
    }

    /// Logic steps run since construction.
    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // -- loop control -------------------------------------------------------

    /// Start the loop clock at `now_ms`. A running simulation is unaffected.
    pub fn start(&mut self, now_ms: f64) {
        if self.game_loop.is_running() {
            return;
        }
        self.started_ms = now_ms;
        self.game_loop.start(now_ms);
        info!(entities = self.entities.alive_count(), "simulation started");
    }

    /// [`start`](Self::start) on the simulation's monotonic clock.
    pub fn start_now(&mut self) {
        let now = self.now_ms();
        self.start(now);
    }

    pub fn stop(&mut self) {
        self.game_loop.stop();
        info!(ticks = self.ticks, "simulation stopped");
    }

    pub fn is_running(&self) -> bool {
        self.game_loop.is_running()
    }

    /// Advance to `now_ms`: run the due logic steps, then draw.
    pub fn frame(&mut self, now_ms: f64) -> Result<FrameSteps, SimError> {
        let steps = self.game_loop.advance(now_ms);
        if !self.game_loop.is_running() {
            return Ok(steps);
        }
        for _ in 0..steps.ticks {
            self.update_game_logic()?;
        }
        self.frame.time_ms = now_ms - self.started_ms;
        self.views.draw(view_ctx!(self), steps.lerp);
        Ok(steps)
    }

    /// [`frame`](Self::frame) on the simulation's monotonic clock.
    pub fn frame_now(&mut self) -> Result<FrameSteps, SimError> {
        let now = self.now_ms();
        self.frame(now)
    }

    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    /// One fixed logic step.
    pub fn update_game_logic(&mut self) -> Result<(), SimError> {
        self.state.delta_time = self.config.game_loop.step_seconds();
        self.drain_commands();
        tick(&mut self.state)?;
        self.views.update(view_ctx!(self));
        self.ticks += 1;
        Ok(())
    }

    fn drain_commands(&mut self) {
        let limit = self.config.commands.max_drain_per_tick;
        let mut executed = 0;
        while let Some(queued) = self.state.commands.pop_front() {
            if executed == limit {
                self.state.commands.push_front(queued);
                warn!(
                    deferred = self.state.commands.len(),
                    limit, "command cascade hit the per-tick limit, deferring the rest"
                );
                break;
            }
            executed += 1;

            let name = queued.name().to_owned();
            if let Err(err) = queued.execute(self) {
                error!(command = %name, error = %err, "command failed");
                self.state.events.push(SimulationEvent::CommandFailed {
                    command: name,
                    error: err.to_string(),
                });
            }
        }
    }

    /// The viewport changed; views update their cameras.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.frame.viewport = Viewport { width, height };
        self.views.camera_update(view_ctx!(self));
    }

    // -- entities -----------------------------------------------------------

    pub fn create_entity(&mut self) -> EntityId {
        self.entities.create()
    }

    /// Destroy the entity's view, remove it from every repository and free
    /// its id. Returns `false` for a stale or unknown id.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        if !self.entities.is_alive(entity) {
            warn!(entity = %entity, "destroy of a stale entity ignored");
            return false;
        }
        self.views.destroy_entity_view(view_ctx!(self), entity);
        self.state.destroy(entity);
        self.entities.destroy(entity)
    }

    /// Queue a command for the next logic step.
    pub fn enqueue(&mut self, command: SimulationCommand) {
        self.state.commands.push_back(QueuedCommand::new(command));
    }

    /// Trigger an available interaction on `entity`. The command runs in the
    /// next logic step, addressed to the target that made it available.
    pub fn interact(&mut self, entity: EntityId, handle: SensorCommandHandle) -> Result<(), SimError> {
        let (queued, interaction) = self
            .state
            .sensor_commands
            .trigger_interaction(entity, handle)?;
        self.state.commands.push_back(queued);
        self.state.events.push(SimulationEvent::InteractionTriggered {
            entity,
            command: handle,
            target: interaction.target,
        });
        Ok(())
    }

    // -- views --------------------------------------------------------------

    pub fn views(&self) -> &ViewSync {
        &self.views
    }

    pub fn add_entity_view(&mut self, entity: EntityId, view: impl View + 'static) {
        self.views.add_entity_view(entity, Box::new(view));
    }

    pub fn add_auxiliary_view(&mut self, view: impl View + 'static) -> ViewKey {
        self.views.add_auxiliary_view(Box::new(view))
    }

    pub fn destroy_auxiliary_view(&mut self, key: ViewKey) -> bool {
        self.views.destroy_auxiliary_view(view_ctx!(self), key)
    }

    // -- scene lifetime -----------------------------------------------------

    /// A slot for an asset loaded on behalf of the current scene.
    pub fn asset_slot<T>(&self, name: impl Into<String>) -> AssetSlot<T> {
        AssetSlot::new(name, self.scene_token.clone())
    }

    pub fn scene_token(&self) -> CancellationToken {
        self.scene_token.clone()
    }

    /// Tear the scene down: stop the loop, cancel pending loads, clean up
    /// every view. Repositories keep their data.
    pub fn shutdown(&mut self) {
        self.stop();
        self.scene_token.cancel();
        self.views.cleanup(view_ctx!(self));
        self.scene_token = CancellationToken::new();
    }
}
