//! Simulation configuration.
//!
//! All tunables of the loop, the physics integration and the command drain
//! live in [`SimulationConfig`]. Every field has a default, so a JSON file
//! only needs to name what it overrides:
//!
//! ```
//! use lantern_engine::config::SimulationConfig;
//!
//! let config = SimulationConfig::from_json_str(r#"{ "physics": { "terminal_velocity": 20.0 } }"#).unwrap();
//! assert_eq!(config.physics.terminal_velocity, 20.0);
//! assert_eq!(config.physics.gravity, -9.81);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

// ---------------------------------------------------------------------------
// LoopConfig
// ---------------------------------------------------------------------------

/// Fixed-timestep loop settings. Times are in milliseconds, matching the
/// host's frame timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Duration of one logic step. Defaults to 60 Hz.
    pub step_ms: f64,
    /// A frame gap longer than this is a stall: the accumulator is reset and
    /// the gap is dropped instead of replayed as catch-up ticks.
    pub max_pause_ms: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            step_ms: 1000.0 / 60.0,
            max_pause_ms: 1000.0,
        }
    }
}

impl LoopConfig {
    /// Step duration in seconds, the `delta_time` systems see.
    pub fn step_seconds(&self) -> f32 {
        (self.step_ms / 1000.0) as f32
    }
}

// ---------------------------------------------------------------------------
// PhysicsConfig
// ---------------------------------------------------------------------------

/// Character-controller and gravity settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Vertical acceleration applied to gravity-affected characters (units/s^2).
    pub gravity: f32,
    /// Magnitude clamp for vertical velocity (units/s).
    pub terminal_velocity: f32,
    /// Steepest slope a character can walk up, in degrees.
    pub max_slope_climb_deg: f32,
    /// Tallest step a character climbs automatically.
    pub autostep_max_height: f32,
    /// Minimum free width on top of a step for autostep to apply.
    pub autostep_min_width: f32,
    /// Off by default: snapping makes characters stick on step edges.
    pub snap_to_ground: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            terminal_velocity: 50.0,
            max_slope_climb_deg: 45.0,
            autostep_max_height: 1.0,
            autostep_min_width: 0.01,
            snap_to_ground: false,
        }
    }
}

// ---------------------------------------------------------------------------
// CommandConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Upper bound on commands executed in one drain. Commands that enqueue
    /// commands are drained in the same tick until the queue is empty or this
    /// many have run; the rest carry over to the next tick.
    pub max_drain_per_tick: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            max_drain_per_tick: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    #[serde(rename = "loop")]
    pub game_loop: LoopConfig,
    pub physics: PhysicsConfig,
    pub commands: CommandConfig,
}

impl SimulationConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject settings the loop or physics cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        let step = self.game_loop.step_ms;
        if !(step > 0.0 && step.is_finite()) {
            return Err(SimError::Config(format!(
                "loop.step_ms must be positive and finite, got {step}"
            )));
        }
        if !(self.game_loop.max_pause_ms >= step) {
            return Err(SimError::Config(format!(
                "loop.max_pause_ms ({}) must be at least one step ({step})",
                self.game_loop.max_pause_ms
            )));
        }
        let terminal = self.physics.terminal_velocity;
        if !(terminal > 0.0 && terminal.is_finite()) {
            return Err(SimError::Config(format!(
                "physics.terminal_velocity must be positive and finite, got {terminal}"
            )));
        }
        if self.commands.max_drain_per_tick == 0 {
            return Err(SimError::Config(
                "commands.max_drain_per_tick must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
