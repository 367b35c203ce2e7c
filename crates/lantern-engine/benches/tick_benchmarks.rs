//! Logic tick throughput.
//!
//! A 60 Hz loop has 16.67ms per frame; the simulation tick should stay well
//! under 2ms with a few hundred walking characters and a room full of sensors,
//! leaving the rest of the frame to rendering.
//!
//! Run with: `cargo bench --bench tick_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use lantern_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A floor, `sensor_count` sensor boxes carrying a repeat interaction, and
/// `walker_count` characters walking in circles under gravity.
fn setup_room(walker_count: usize, sensor_count: usize) -> (Simulation, Vec<EntityId>) {
    let mut sim = Simulation::new(SimulationConfig::default()).expect("default config is valid");

    let floor = sim.create_entity();
    let state = sim.state_mut();
    state.physics.create_component(floor);
    state
        .physics
        .add_box_collider(floor, Vec3::new(400.0, 1.0, 400.0), Vec3::new(0.0, -0.5, 0.0), None, false)
        .expect("floor collider");

    for i in 0..sensor_count {
        let sensor = sim.create_entity();
        let state = sim.state_mut();
        state.physics.create_component(sensor);
        state.sensor_commands.create_component(sensor);
        let x = (i % 20) as f32 * 10.0 - 100.0;
        let z = (i / 20) as f32 * 10.0 - 100.0;
        state
            .physics
            .add_box_collider(sensor, Vec3::splat(3.0), Vec3::new(x, 1.0, z), None, true)
            .expect("sensor collider");
        state
            .sensor_commands
            .add_sensor_command(SensorCommandSpec::interaction(
                sensor,
                SimulationCommand::log("inspect"),
            ))
            .expect("sensor command");
    }

    let mut walkers = Vec::with_capacity(walker_count);
    for i in 0..walker_count {
        let walker = sim.create_entity();
        let state = sim.state_mut();
        let x = (i % 25) as f32 * 6.0 - 75.0;
        let z = (i / 25) as f32 * 6.0 - 75.0;
        state.physics.create_component(walker);
        state.movement.create_component(walker);
        state.sensor_targets.create_component(walker);
        state
            .physics
            .create_character_controller_with_sphere(walker, Vec3::new(x, 0.6, z), 0.5, 0.01)
            .expect("character");
        state.physics.set_affected_by_gravity(walker, true).expect("gravity");
        state.movement.set_speed(walker, 3.0).expect("speed");
        walkers.push(walker);
    }

    (sim, walkers)
}

fn steer(sim: &mut Simulation, walkers: &[EntityId], tick: u64) {
    let angle = tick as f32 * 0.05;
    let direction = Vec3::new(angle.cos(), 0.0, angle.sin());
    for &walker in walkers {
        let _ = sim.state_mut().movement.set_direction(walker, direction);
    }
}

// ---------------------------------------------------------------------------
// Benchmark 1: one tick with 100 walkers and 50 sensors
// ---------------------------------------------------------------------------

fn bench_tick_100_walkers(c: &mut Criterion) {
    let (mut sim, walkers) = setup_room(100, 50);
    let mut tick = 0u64;

    c.bench_function("tick_100_walkers_50_sensors", |b| {
        b.iter(|| {
            tick += 1;
            steer(&mut sim, &walkers, tick);
            sim.update_game_logic().expect("tick");
            black_box(sim.state_mut().drain_events());
        });
    });
}

// ---------------------------------------------------------------------------
// Benchmark 2: scaling with walker count
// ---------------------------------------------------------------------------

fn bench_tick_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_scaling");

    for &count in &[10usize, 100, 250, 500] {
        let (mut sim, walkers) = setup_room(count, 50);
        let mut tick = 0u64;

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &_count| {
            b.iter(|| {
                tick += 1;
                steer(&mut sim, &walkers, tick);
                sim.update_game_logic().expect("tick");
                black_box(sim.tick_count());
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark 3: stat evaluation with stacked modifiers
// ---------------------------------------------------------------------------

fn bench_stat_computed_value(c: &mut Criterion) {
    let mut stats = StatRepository::new();
    let hero = EntityId::new(0, 0);
    stats.create_component(hero);
    stats
        .set_stat_base_value(hero, StatType::Speed, 4.0)
        .expect("base value");
    for i in 0..64 {
        let modifier = if i % 2 == 0 {
            Modifier::add(StatType::Speed, 0.25)
        } else {
            Modifier::multiply(StatType::Speed, 1.01)
        };
        stats.create_status_effect(hero, modifier).expect("effect");
    }

    c.bench_function("stat_computed_value_64_modifiers", |b| {
        b.iter(|| {
            black_box(stats.stat_computed_value(hero, StatType::Speed).expect("stat"));
        });
    });
}

// ---------------------------------------------------------------------------
// Criterion groups and main
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_tick_100_walkers,
    bench_tick_scaling,
    bench_stat_computed_value,
);

criterion_main!(benches);
