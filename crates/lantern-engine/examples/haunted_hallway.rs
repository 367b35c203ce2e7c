//! Headless walk down a haunted hallway.
//!
//! The player walks forward along +Z. Halfway down, a sensor fires a one-shot
//! scare; at the end, a door offers an interaction the player triggers as soon
//! as it becomes available. A camera view follows the player with
//! interpolated positions and logs where it is every half second.
//!
//! Run with:
//!   cargo run --example haunted_hallway -p lantern-engine
//!
//! Set `RUST_LOG=debug` to see every tick's command drain.

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use lantern_engine::prelude::*;
use tracing::info;

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Follows one entity; stands in for a renderer's camera rig.
struct FollowCamera {
    target: EntityId,
    last_report_ms: f64,
}

impl View for FollowCamera {
    fn depth(&self) -> i32 {
        100
    }

    fn draw(&mut self, ctx: &mut ViewContext<'_>, lerp: f32) {
        if ctx.frame.time_ms - self.last_report_ms < 500.0 {
            return;
        }
        self.last_report_ms = ctx.frame.time_ms;
        if let Ok(eye) = ctx.state.physics.interpolated_position(self.target, lerp) {
            info!(
                t_ms = ctx.frame.time_ms as u64,
                x = eye.x,
                y = eye.y,
                z = eye.z,
                "camera"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

struct Hallway {
    player: EntityId,
    door: EntityId,
    door_opened: Rc<Cell<bool>>,
}

fn build_hallway(sim: &mut Simulation) -> anyhow::Result<Hallway> {
    let level = sim.create_entity();
    let geometry = SceneNode::new("hallway")
        .with_child(
            SceneNode::new("floor")
                .with_translation(Vec3::new(0.0, -0.5, 15.0))
                .with_mesh(MeshData::cuboid(Vec3::new(4.0, 1.0, 34.0))),
        )
        .with_child(
            SceneNode::new("left_wall")
                .with_translation(Vec3::new(-2.5, 1.5, 15.0))
                .with_mesh(MeshData::cuboid(Vec3::new(1.0, 4.0, 34.0))),
        )
        .with_child(
            SceneNode::new("right_wall")
                .with_translation(Vec3::new(2.5, 1.5, 15.0))
                .with_mesh(MeshData::cuboid(Vec3::new(1.0, 4.0, 34.0))),
        );
    let state = sim.state_mut();
    state.physics.create_component(level);
    state
        .physics
        .add_colliders_from_object(level, &geometry)
        .context("hallway geometry")?;

    let scare = sim.create_entity();
    let state = sim.state_mut();
    state.physics.create_component(scare);
    state.sensor_commands.create_component(scare);
    state
        .physics
        .add_box_collider(scare, Vec3::new(4.0, 3.0, 1.0), Vec3::new(0.0, 1.0, 10.0), None, true)?;
    state.sensor_commands.add_sensor_command(
        SensorCommandSpec::immediate(
            scare,
            SimulationCommand::Emit(SimulationEvent::custom(
                "scare",
                serde_json::json!({ "sound": "whisper" }),
            )),
        )
        .once()
        .with_owner("Whisper"),
    )?;

    let door = sim.create_entity();
    let door_opened = Rc::new(Cell::new(false));
    let opened = Rc::clone(&door_opened);
    let state = sim.state_mut();
    state.physics.create_component(door);
    state.sensor_commands.create_component(door);
    state.hints.create_component(door);
    state.hints.set_type(door, HintType::Look)?;
    state.hints.set_position(door, Vec3::new(0.0, 1.5, 26.0))?;
    state
        .physics
        .add_box_collider(door, Vec3::new(4.0, 3.0, 2.0), Vec3::new(0.0, 1.0, 25.0), None, true)?;
    state.sensor_commands.add_sensor_command(
        SensorCommandSpec::interaction(
            door,
            SimulationCommand::script("open_door", move |sim, trigger| {
                opened.set(true);
                if let Some(player) = trigger {
                    sim.state_mut().movement.set_speed(player, 0.0)?;
                }
                Ok(())
            }),
        )
        .once()
        .with_owner("Door"),
    )?;

    let player = sim.create_entity();
    let state = sim.state_mut();
    state.physics.create_component(player);
    state.movement.create_component(player);
    state.sensor_targets.create_component(player);
    state
        .physics
        .create_character_controller_with_sphere(player, Vec3::new(0.0, 1.0, 0.0), 0.5, 0.01)?;
    state.physics.set_affected_by_gravity(player, true)?;
    state.movement.set_direction(player, Vec3::Z)?;
    state.movement.set_speed(player, 3.0)?;

    Ok(Hallway {
        player,
        door,
        door_opened,
    })
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    lantern_engine::logging::init_tracing();

    let mut sim = Simulation::new(SimulationConfig::default())?;
    let hallway = build_hallway(&mut sim)?;
    sim.add_auxiliary_view(FollowCamera {
        target: hallway.player,
        last_report_ms: f64::NEG_INFINITY,
    });

    // Simulated 60 Hz display clock; the demo does not sleep.
    sim.start(0.0);
    let mut now_ms = 0.0;
    while !hallway.door_opened.get() && now_ms < 20_000.0 {
        now_ms += 1000.0 / 60.0;
        sim.frame(now_ms)?;

        for event in sim.state_mut().drain_events() {
            info!(event = %serde_json::to_string(&event)?, "event");
        }

        let eye = sim.state().physics.position(hallway.player)?;
        let available = sim
            .state()
            .sensor_commands
            .closest_interaction(&sim.state().physics, eye, Vec3::Z);
        if let Some((entity, interaction)) = available {
            let owner = sim
                .state()
                .sensor_commands
                .sensor_command(interaction.handle)?
                .owner
                .clone()
                .unwrap_or_default();
            info!(%owner, "interacting");
            sim.interact(entity, interaction.handle)?;
        }
    }

    anyhow::ensure!(hallway.door_opened.get(), "never reached the door");
    info!(
        ticks = sim.tick_count(),
        door_alive = sim.entities().is_alive(hallway.door),
        "reached the end of the hallway"
    );
    sim.shutdown();
    Ok(())
}
