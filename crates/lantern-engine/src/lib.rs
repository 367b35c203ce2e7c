//! Lantern Engine -- simulation core for first-person exploration games.
//!
//! This crate builds on [`lantern_ecs`] to provide the game-facing
//! simulation: concrete repositories (physics, movement, stats, sensors,
//! transforms, hints), the systems that run over them every fixed tick, the
//! sensor/command machinery that lets level designers wire interactive
//! objects, and a fixed-timestep loop that drives presentation views with
//! interpolation.
//!
//! Collision and character movement are delegated to `rapier3d`. Rendering,
//! audio and asset loading are the host's business; they plug in as
//! [`View`](view::View)s.
//!
//! # Quick Start
//!
//! ```
//! use lantern_engine::prelude::*;
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
//!
//! let player = sim.create_entity();
//! let state = sim.state_mut();
//! state.physics.create_component(player);
//! state
//!     .physics
//!     .create_character_controller_with_sphere(player, Vec3::new(0.0, 5.0, 0.0), 0.5, 0.01)
//!     .unwrap();
//! state.physics.set_affected_by_gravity(player, true).unwrap();
//!
//! sim.start(0.0);
//! sim.frame(500.0).unwrap();
//!
//! assert!(sim.state().physics.position(player).unwrap().y < 5.0);
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod config;
pub mod error;
pub mod event;
pub mod game_loop;
pub mod hint;
pub mod loading;
pub mod logging;
mod math;
pub mod movement;
pub mod physics;
pub mod scene;
pub mod sensor;
pub mod simulation;
pub mod state;
pub mod stats;
pub mod systems;
pub mod transform;
pub mod view;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use lantern_ecs;

pub use error::SimError;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use lantern_ecs::prelude::*;

    pub use glam::{Quat, Vec3};
    pub use rapier3d::prelude::ColliderHandle;

    pub use crate::command::{CommandTarget, QueuedCommand, ScriptCommand, SimulationCommand};
    pub use crate::config::{CommandConfig, LoopConfig, PhysicsConfig, SimulationConfig};
    pub use crate::error::SimError;
    pub use crate::event::SimulationEvent;
    pub use crate::game_loop::{FrameSteps, GameLoop};
    pub use crate::hint::{HintRepository, HintType};
    pub use crate::loading::{AssetSlot, CancellationToken, LoadState};
    pub use crate::movement::MovementRepository;
    pub use crate::physics::PhysicsRepository;
    pub use crate::scene::{MeshData, SceneNode};
    pub use crate::sensor::{
        AvailableInteraction, ExecutionMode, SensorCommandHandle, SensorCommandRepository,
        SensorCommandSpec, SensorTargetRepository,
    };
    pub use crate::simulation::Simulation;
    pub use crate::state::SimulationState;
    pub use crate::stats::{Modifier, ModifierType, StatRepository, StatType, StatusEffectHandle};
    pub use crate::systems::tick;
    pub use crate::transform::TransformRepository;
    pub use crate::view::{FrameContext, InputState, View, ViewContext, ViewKey, ViewSync, Viewport};
}
