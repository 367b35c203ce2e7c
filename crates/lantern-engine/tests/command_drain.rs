//! Command queue semantics of `Simulation::update_game_logic`.
//!
//! Validates:
//! 1. Commands queued while draining run in the same step
//! 2. A runaway cascade is capped per step and resumes next step
//! 3. A failing command is reported and does not stop the drain
//! 4. `Destroy` removes views, components and the id

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lantern_engine::prelude::*;

fn sim_with_limit(limit: usize) -> Simulation {
    let mut config = SimulationConfig::default();
    config.commands.max_drain_per_tick = limit;
    Simulation::new(config).unwrap()
}

#[test]
fn cascades_drain_in_the_same_step() {
    let mut sim = sim_with_limit(1024);
    let order = Rc::new(RefCell::new(Vec::new()));

    let inner_order = Rc::clone(&order);
    let outer_order = Rc::clone(&order);
    sim.enqueue(SimulationCommand::script("outer", move |sim, _| {
        outer_order.borrow_mut().push("outer");
        let inner_order = Rc::clone(&inner_order);
        sim.enqueue(SimulationCommand::script("inner", move |_, _| {
            inner_order.borrow_mut().push("inner");
            Ok(())
        }));
        Ok(())
    }));

    sim.update_game_logic().unwrap();

    assert_eq!(*order.borrow(), vec!["outer", "inner"]);
    assert!(sim.state().commands.is_empty());
}

/// A command that re-queues itself forever.
fn runaway(counter: Rc<Cell<u32>>) -> SimulationCommand {
    SimulationCommand::script("runaway", move |sim, _| {
        counter.set(counter.get() + 1);
        sim.enqueue(runaway(Rc::clone(&counter)));
        Ok(())
    })
}

#[test]
fn runaway_cascade_is_capped_per_step() {
    let mut sim = sim_with_limit(8);
    let counter = Rc::new(Cell::new(0));
    sim.enqueue(runaway(Rc::clone(&counter)));

    sim.update_game_logic().unwrap();
    assert_eq!(counter.get(), 8);
    assert_eq!(sim.state().commands.len(), 1);

    sim.update_game_logic().unwrap();
    assert_eq!(counter.get(), 16);
}

#[test]
fn failing_command_does_not_abort_the_drain() {
    let mut sim = sim_with_limit(1024);
    let ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&ran);

    let ghost = sim.create_entity();
    sim.enqueue(SimulationCommand::SetSpeed {
        target: ghost.into(),
        speed: 3.0,
    });
    sim.enqueue(SimulationCommand::script("boom", |_, _| anyhow::bail!("fuse blown")));
    sim.enqueue(SimulationCommand::script("after", move |_, _| {
        flag.set(true);
        Ok(())
    }));

    sim.update_game_logic().unwrap();

    assert!(ran.get());
    let failures: Vec<String> = sim
        .state_mut()
        .drain_events()
        .into_iter()
        .filter_map(|event| match event {
            SimulationEvent::CommandFailed { command, .. } => Some(command),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec!["set_speed", "boom"]);
}

#[test]
fn trigger_target_without_trigger_fails_softly() {
    let mut sim = sim_with_limit(1024);
    sim.enqueue(SimulationCommand::Destroy {
        target: CommandTarget::Trigger,
    });
    sim.update_game_logic().unwrap();
    let events = sim.state_mut().drain_events();
    assert!(matches!(
        events.as_slice(),
        [SimulationEvent::CommandFailed { command, .. }] if command == "destroy"
    ));
}

struct Lamp {
    cleaned: Rc<Cell<bool>>,
}

impl View for Lamp {
    fn cleanup(&mut self, _ctx: &mut ViewContext<'_>) {
        self.cleaned.set(true);
    }
}

#[test]
fn destroy_command_tears_everything_down() {
    let mut sim = sim_with_limit(1024);
    let lamp = sim.create_entity();
    let cleaned = Rc::new(Cell::new(false));

    sim.state_mut().physics.create_component(lamp);
    sim.state_mut()
        .physics
        .add_box_collider(lamp, Vec3::ONE, Vec3::ZERO, None, false)
        .unwrap();
    sim.state_mut().hints.create_component(lamp);
    sim.add_entity_view(
        lamp,
        Lamp {
            cleaned: Rc::clone(&cleaned),
        },
    );

    sim.enqueue(SimulationCommand::Destroy { target: lamp.into() });
    sim.update_game_logic().unwrap();

    assert!(cleaned.get());
    assert!(!sim.views().has_entity_view(lamp));
    assert!(!sim.state().physics.has_component(lamp));
    assert!(!sim.state().hints.has_component(lamp));
    assert_eq!(sim.state().physics.collider_count(), 0);
    assert!(!sim.entities().is_alive(lamp));
}

#[test]
fn emitted_events_reach_game_code() {
    let mut sim = sim_with_limit(1024);
    sim.enqueue(SimulationCommand::Emit(SimulationEvent::custom(
        "lights_out",
        serde_json::json!({ "room": "kitchen" }),
    )));
    sim.update_game_logic().unwrap();
    assert_eq!(
        sim.state_mut().drain_events(),
        vec![SimulationEvent::custom(
            "lights_out",
            serde_json::json!({ "room": "kitchen" })
        )]
    );
}

#[test]
fn status_effects_can_be_revoked_by_command() {
    let mut sim = sim_with_limit(1024);
    let hero = sim.create_entity();
    let stats = &mut sim.state_mut().stats;
    stats.create_component(hero);
    stats.set_stat_base_value(hero, StatType::Speed, 4.0).unwrap();
    let slow = stats
        .create_status_effect(hero, Modifier::multiply(StatType::Speed, 0.5))
        .unwrap();
    assert_eq!(stats.stat_computed_value(hero, StatType::Speed).unwrap(), 2.0);

    sim.enqueue(SimulationCommand::RemoveStatusEffect {
        target: hero.into(),
        handle: slow,
    });
    sim.update_game_logic().unwrap();
    assert_eq!(
        sim.state().stats.stat_computed_value(hero, StatType::Speed).unwrap(),
        4.0
    );
}
