//! Fixed-timestep accumulator.
//!
//! The host calls [`GameLoop::advance`] once per displayed frame with a
//! millisecond timestamp. Real time accumulates and is spent in whole logic
//! steps; what is left over becomes the interpolation factor for drawing.
//! The number of logic steps per frame therefore varies with the display
//! rate while the simulation itself always advances in identical steps.
//!
//! ```
//! use lantern_engine::config::LoopConfig;
//! use lantern_engine::game_loop::GameLoop;
//!
//! let mut game_loop = GameLoop::new(LoopConfig { step_ms: 10.0, max_pause_ms: 1000.0 });
//! game_loop.start(0.0);
//!
//! let steps = game_loop.advance(25.0);
//! assert_eq!(steps.ticks, 2);
//! assert!((steps.lerp - 0.5).abs() < 1e-6);
//! ```

use tracing::{debug, warn};

use crate::config::LoopConfig;

/// Work to do for one displayed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSteps {
    /// Logic steps to run before drawing.
    pub ticks: u32,
    /// Interpolation factor for drawing, in `[0, 1)`.
    pub lerp: f32,
}

#[derive(Debug, Clone)]
pub struct GameLoop {
    config: LoopConfig,
    running: bool,
    last_frame_ms: f64,
    accumulated_ms: f64,
}

impl GameLoop {
    pub fn new(config: LoopConfig) -> Self {
        Self {
            config,
            running: false,
            last_frame_ms: 0.0,
            accumulated_ms: 0.0,
        }
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Begin timing from `now_ms`. Starting a running loop does nothing.
    pub fn start(&mut self, now_ms: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_frame_ms = now_ms;
        debug!(now_ms, "game loop started");
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Leftover time not yet spent on a logic step.
    pub fn accumulated_ms(&self) -> f64 {
        self.accumulated_ms
    }

    /// Account for real time up to `now_ms` and return the frame's work.
    ///
    /// A gap longer than `max_pause_ms` (a backgrounded tab, a debugger
    /// break) is dropped: the accumulator resets to zero and no catch-up
    /// steps run. A stopped loop never produces steps.
    pub fn advance(&mut self, now_ms: f64) -> FrameSteps {
        if !self.running {
            return FrameSteps {
                ticks: 0,
                lerp: self.lerp(),
            };
        }

        let mut elapsed = (now_ms - self.last_frame_ms).max(0.0);
        if elapsed > self.config.max_pause_ms {
            warn!(elapsed_ms = elapsed, "frame gap exceeds max pause, dropping it");
            self.accumulated_ms = 0.0;
            elapsed = 0.0;
        }
        self.last_frame_ms = now_ms;
        self.accumulated_ms += elapsed;

        let mut ticks = 0;
        while self.accumulated_ms >= self.config.step_ms {
            self.accumulated_ms -= self.config.step_ms;
            ticks += 1;
        }

        FrameSteps {
            ticks,
            lerp: self.lerp(),
        }
    }

    fn lerp(&self) -> f32 {
        ((self.accumulated_ms / self.config.step_ms) as f32).clamp(0.0, 1.0 - f32::EPSILON)
    }
}
