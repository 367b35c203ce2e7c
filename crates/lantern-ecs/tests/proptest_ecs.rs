//! Property tests for the registry and component stores.
//!
//! Random sequences of create/remove/destroy operations are applied to an
//! [`EntityRegistry`] plus a repository, and the repository contract is
//! checked after every step against a simple model.

use lantern_ecs::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Lamp {
    lit: bool,
}

struct LampRepository {
    store: ComponentStore<Lamp>,
}

lantern_ecs::impl_store_repository!(LampRepository);

/// Operations we can perform.
#[derive(Debug, Clone)]
enum Op {
    Create,
    AddLamp(usize),
    RemoveLamp(usize),
    Light(usize),
    Destroy(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0..64usize).prop_map(Op::AddLamp),
        (0..64usize).prop_map(Op::RemoveLamp),
        (0..64usize).prop_map(Op::Light),
        (0..64usize).prop_map(Op::Destroy),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn repository_contract_holds_under_random_ops(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut registry = EntityRegistry::new();
        let mut lamps = LampRepository { store: ComponentStore::new("lamp") };

        let mut alive: Vec<EntityId> = Vec::new();
        // Model of lamp membership in insertion order.
        let mut with_lamp: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                Op::Create => alive.push(registry.create()),
                Op::AddLamp(i) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    lamps.create_component(e);
                    if !with_lamp.contains(&e) {
                        with_lamp.push(e);
                    }
                    prop_assert_eq!(lamps.store.get(e).unwrap(), &Lamp::default());
                }
                Op::RemoveLamp(i) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    lamps.remove_component(e);
                    lamps.remove_component(e);
                    with_lamp.retain(|x| *x != e);
                    prop_assert!(!lamps.has_component(e));
                }
                Op::Light(i) if !alive.is_empty() => {
                    let e = alive[i % alive.len()];
                    match lamps.store.get_mut(e) {
                        Ok(lamp) => {
                            prop_assert!(with_lamp.contains(&e));
                            lamp.lit = true;
                        }
                        Err(EcsError::ComponentNotFound { repository, entity }) => {
                            prop_assert_eq!(repository, "lamp");
                            prop_assert_eq!(entity, e);
                            prop_assert!(!with_lamp.contains(&e));
                        }
                        Err(other) => prop_assert!(false, "unexpected error {other}"),
                    }
                }
                Op::Destroy(i) if !alive.is_empty() => {
                    let e = alive.remove(i % alive.len());
                    lamps.remove_component(e);
                    with_lamp.retain(|x| *x != e);
                    prop_assert!(registry.destroy(e));
                    prop_assert!(!registry.is_alive(e));
                }
                _ => {}
            }

            prop_assert_eq!(lamps.entities(), with_lamp.clone());
            prop_assert_eq!(registry.alive_count(), alive.len());
            for &e in &alive {
                prop_assert!(registry.is_alive(e));
            }
        }
    }

    /// Destroyed ids stay stale even after their slot is recycled.
    #[test]
    fn stale_ids_detected_after_recycle(
        spawn_count in 1..20usize,
        destroy_indices in prop::collection::vec(0..20usize, 1..10),
    ) {
        let mut registry = EntityRegistry::new();
        let mut entities: Vec<EntityId> = (0..spawn_count).map(|_| registry.create()).collect();
        let mut stale = Vec::new();

        for idx in destroy_indices {
            if !entities.is_empty() {
                let e = entities.remove(idx % entities.len());
                registry.destroy(e);
                stale.push(e);
            }
        }

        for _ in 0..stale.len() {
            entities.push(registry.create());
        }

        for &e in &stale {
            prop_assert!(!registry.is_alive(e));
            prop_assert!(!entities.contains(&e));
        }
        for &e in &entities {
            prop_assert!(registry.is_alive(e));
        }
    }
}
