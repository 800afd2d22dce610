//! Property tests for registry and pool bookkeeping.
//!
//! Random sequences of register / unregister / despawn / obtain / dispose /
//! deferred-command operations are applied to a small set of objects; after
//! every step each object must be in exactly one place.

use bulwark_core::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create,
    Register(usize),
    Unregister(usize),
    Despawn(usize, bool),
    Obtain,
    Dispose(usize),
    QueueDespawn(usize),
    QueueDispose(usize),
    Frame,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Create),
        (0..12usize).prop_map(Op::Register),
        (0..12usize).prop_map(Op::Unregister),
        (0..12usize, any::<bool>()).prop_map(|(i, keyed)| Op::Despawn(i, keyed)),
        Just(Op::Obtain),
        (0..12usize).prop_map(Op::Dispose),
        (0..12usize).prop_map(Op::QueueDespawn),
        (0..12usize).prop_map(Op::QueueDispose),
        Just(Op::Frame),
    ]
}

const POOL: &str = "shell";

fn pick(ids: &[ObjectId], i: usize) -> Option<ObjectId> {
    (!ids.is_empty()).then(|| ids[i % ids.len()])
}

fn apply(world: &mut World, ids: &mut Vec<ObjectId>, disposed: &mut Vec<ObjectId>, op: &Op) {
    let reason = || CausalReason::GameRule("prop".to_owned());
    match op {
        Op::Create => {
            if let Ok(id) = world.create(ObjectBuilder::new("obj")) {
                ids.push(id);
            }
        }
        Op::Register(i) => {
            if let Some(id) = pick(ids, *i) {
                world.register(id);
            }
        }
        Op::Unregister(i) => {
            if let Some(id) = pick(ids, *i) {
                world.unregister(id);
            }
        }
        Op::Despawn(i, keyed) => {
            if let Some(id) = pick(ids, *i) {
                world.despawn(id, keyed.then_some(POOL));
            }
        }
        Op::Obtain => {
            if let Ok(id) = world.obtain(POOL, |w| w.create(ObjectBuilder::new("fresh"))) {
                if !ids.contains(&id) {
                    ids.push(id);
                }
                world.register(id);
            }
        }
        Op::Dispose(i) => {
            if let Some(id) = pick(ids, *i) {
                world.dispose(id);
            }
        }
        Op::QueueDespawn(i) => {
            if let Some(id) = pick(ids, *i) {
                world.commands_mut().despawn(id, Some(POOL), reason());
            }
        }
        Op::QueueDispose(i) => {
            if let Some(id) = pick(ids, *i) {
                world.commands_mut().dispose(id, reason());
            }
        }
        Op::Frame => {
            world.update();
        }
    }
    ids.retain(|&id| {
        let alive = world.contains(id);
        if !alive {
            disposed.push(id);
        }
        alive
    });
}

fn check_invariants(world: &World, ids: &[ObjectId], disposed: &[ObjectId]) {
    let live = world.live_ids();
    let mut sorted = live.to_vec();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), live.len(), "live list has duplicates");

    let pooled = world.pooled_ids(POOL);
    for &id in ids {
        let in_live = live.contains(&id);
        let pool_hits = pooled.iter().filter(|&&p| p == id).count();
        match world.state(id) {
            Some(ObjectState::Live) => assert!(in_live && pool_hits == 0, "{id} live"),
            Some(ObjectState::Pooled) => assert!(!in_live && pool_hits == 1, "{id} pooled"),
            Some(ObjectState::Unregistered) => {
                assert!(!in_live && pool_hits == 0, "{id} unregistered")
            }
            other => panic!("{id} in unexpected state {other:?}"),
        }
    }
    for &id in disposed {
        assert!(!world.contains(id));
        assert!(!live.contains(&id), "disposed {id} still iterated");
        assert!(!pooled.contains(&id), "disposed {id} still pooled");
    }
}

proptest! {
    #[test]
    fn objects_are_live_pooled_or_parked_never_both(
        ops in prop::collection::vec(op_strategy(), 1..80)
    ) {
        let mut world = World::new();
        let mut ids = Vec::new();
        let mut disposed = Vec::new();
        for op in &ops {
            apply(&mut world, &mut ids, &mut disposed, op);
            check_invariants(&world, &ids, &disposed);
        }
    }

    #[test]
    fn second_dispose_is_always_a_noop(count in 1..20usize) {
        let mut world = World::new();
        let ids: Vec<ObjectId> = (0..count)
            .map(|_| world.create(ObjectBuilder::new("obj")).unwrap())
            .collect();
        for &id in &ids {
            world.register(id);
        }
        for &id in &ids {
            prop_assert!(world.dispose(id));
            prop_assert!(!world.dispose(id));
        }
        prop_assert_eq!(world.live_count(), 0);
        prop_assert_eq!(world.object_count(), 0);
    }
}
