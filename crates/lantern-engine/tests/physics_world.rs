//! Character controllers against level geometry.
//!
//! Validates:
//! 1. A falling character lands on a floor and stops accumulating velocity
//! 2. A walking character is stopped by a wall but keeps falling separately
//! 3. Colliders extracted from a scene graph are solid
//! 4. Gravity never exceeds the terminal velocity, whatever the step size

use lantern_engine::prelude::*;
use proptest::prelude::*;

fn sim() -> Simulation {
    Simulation::new(SimulationConfig::default()).unwrap()
}

fn spawn_player(sim: &mut Simulation, position: Vec3) -> EntityId {
    let player = sim.create_entity();
    let state = sim.state_mut();
    state.physics.create_component(player);
    state
        .physics
        .create_character_controller_with_sphere(player, position, 0.5, 0.01)
        .unwrap();
    state.physics.set_affected_by_gravity(player, true).unwrap();
    state.movement.create_component(player);
    player
}

fn spawn_floor(sim: &mut Simulation) -> EntityId {
    let level = sim.create_entity();
    let state = sim.state_mut();
    state.physics.create_component(level);
    state
        .physics
        .add_box_collider(
            level,
            Vec3::new(40.0, 1.0, 40.0),
            Vec3::new(0.0, -0.5, 0.0),
            None,
            false,
        )
        .unwrap();
    level
}

#[test]
fn character_lands_and_rests_on_floor() {
    let mut sim = sim();
    spawn_floor(&mut sim);
    let player = spawn_player(&mut sim, Vec3::new(0.0, 4.0, 0.0));

    for _ in 0..240 {
        sim.update_game_logic().unwrap();
    }

    let physics = &sim.state().physics;
    let y = physics.position(player).unwrap().y;
    assert!(y > 0.4 && y < 0.7, "resting height {y}");
    assert!(physics.vertical_velocity(player).unwrap().abs() < 1.0);
    assert!(physics.is_grounded(player).unwrap());
}

#[test]
fn wall_stops_walking_character() {
    let mut sim = sim();
    spawn_floor(&mut sim);
    let wall = sim.create_entity();
    {
        let state = sim.state_mut();
        state.physics.create_component(wall);
        state
            .physics
            .add_box_collider(wall, Vec3::new(1.0, 6.0, 40.0), Vec3::new(3.0, 3.0, 0.0), None, false)
            .unwrap();
    }
    let player = spawn_player(&mut sim, Vec3::new(0.0, 0.6, 0.0));
    sim.state_mut()
        .movement
        .set_direction(player, Vec3::X)
        .unwrap();
    sim.state_mut().movement.set_speed(player, 4.0).unwrap();

    for _ in 0..180 {
        sim.update_game_logic().unwrap();
    }

    let position = sim.state().physics.position(player).unwrap();
    assert!(position.x < 2.1, "character walked into the wall: {position:?}");
    assert!(position.x > 1.5, "character stopped short: {position:?}");
    assert!(position.y > 0.4 && position.y < 0.7);
}

#[test]
fn scene_graph_geometry_is_solid() {
    let mut sim = sim();
    let level = sim.create_entity();
    let floor = SceneNode::new("hallway").with_child(
        SceneNode::new("floor")
            .with_translation(Vec3::new(0.0, -0.5, 0.0))
            .with_mesh(MeshData::cuboid(Vec3::new(40.0, 1.0, 40.0))),
    );
    {
        let state = sim.state_mut();
        state.physics.create_component(level);
        let handles = state.physics.add_colliders_from_object(level, &floor).unwrap();
        assert_eq!(handles.len(), 1);
    }
    let player = spawn_player(&mut sim, Vec3::new(0.0, 3.0, 0.0));

    for _ in 0..240 {
        sim.update_game_logic().unwrap();
    }

    let y = sim.state().physics.position(player).unwrap().y;
    assert!(y > 0.3 && y < 0.8, "character should rest on the mesh floor, y = {y}");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn gravity_never_exceeds_terminal_velocity(
        dt in 0.001f32..2.0,
        steps in 1usize..40,
        terminal in 1.0f32..80.0,
    ) {
        let mut config = PhysicsConfig::default();
        config.terminal_velocity = terminal;
        let mut physics = PhysicsRepository::new(config, 1.0 / 60.0);
        let e = EntityId::new(0, 0);
        physics.create_component(e);
        physics
            .create_character_controller_with_sphere(e, Vec3::new(0.0, 1_000.0, 0.0), 0.5, 0.01)
            .unwrap();
        physics.set_affected_by_gravity(e, true).unwrap();

        for _ in 0..steps {
            physics.tick_world();
            physics.apply_gravity(e, dt).unwrap();
            physics.tick_world();
            let v = physics.vertical_velocity(e).unwrap();
            prop_assert!(v >= -terminal && v <= terminal, "v = {} with terminal {}", v, terminal);
        }
    }
}
