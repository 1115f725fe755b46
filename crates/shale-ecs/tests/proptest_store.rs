//! Property tests for store operations.
//!
//! These tests use `proptest` to generate random sequences of store
//! operations and verify that store invariants hold after each sequence.

use proptest::prelude::*;
use shale_ecs::prelude::*;

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Pos {
    x: f32,
    y: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Vel {
    dx: f32,
    dy: f32,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
struct Tag(u32);

/// Operations we can perform on the store.
#[derive(Debug, Clone)]
enum StoreOp {
    SpawnPos(f32, f32),
    SpawnPosVel(f32, f32, f32, f32),
    Despawn(usize),
    InsertVel(usize, f32, f32),
    RemoveVel(usize),
    QueryPos,
    QueryPosVel,
}

/// Strategy that generates finite (non-NaN, non-Inf) f32 values.
fn finite_f32() -> impl Strategy<Value = f32> {
    // Use i32 range mapped to f32 to avoid NaN/Inf issues in comparisons
    (-1_000_000i32..1_000_000i32).prop_map(|v| v as f32 * 0.01)
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (finite_f32(), finite_f32()).prop_map(|(x, y)| StoreOp::SpawnPos(x, y)),
        (finite_f32(), finite_f32(), finite_f32(), finite_f32())
            .prop_map(|(x, y, dx, dy)| StoreOp::SpawnPosVel(x, y, dx, dy)),
        (0..100usize).prop_map(StoreOp::Despawn),
        (0..100usize, finite_f32(), finite_f32())
            .prop_map(|(i, dx, dy)| StoreOp::InsertVel(i, dx, dy)),
        (0..100usize).prop_map(StoreOp::RemoveVel),
        Just(StoreOp::QueryPos),
        Just(StoreOp::QueryPosVel),
    ]
}

fn setup_store() -> Store {
    let mut store = Store::new();
    store.register_component::<Pos>("Pos");
    store.register_component::<Vel>("Vel");
    store.register_component::<Tag>("Tag");
    store
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn random_ops_preserve_invariants(ops in prop::collection::vec(store_op_strategy(), 1..50)) {
        let mut store = setup_store();
        let mut alive: Vec<EntityId> = Vec::new();

        for op in ops {
            match op {
                StoreOp::SpawnPos(x, y) => {
                    let e = store.spawn();
                    store.insert(e, Pos { x, y }).unwrap();
                    alive.push(e);
                }
                StoreOp::SpawnPosVel(x, y, dx, dy) => {
                    let e = store.spawn();
                    store.insert(e, Pos { x, y }).unwrap();
                    store.insert(e, Vel { dx, dy }).unwrap();
                    alive.push(e);
                }
                StoreOp::Despawn(idx) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        let e = alive.remove(idx);
                        let _ = store.despawn(e);
                    }
                }
                StoreOp::InsertVel(idx, dx, dy) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        let _ = store.insert(alive[idx], Vel { dx, dy });
                    }
                }
                StoreOp::RemoveVel(idx) => {
                    if !alive.is_empty() {
                        let idx = idx % alive.len();
                        let _ = store.remove::<Vel>(alive[idx]);
                    }
                }
                StoreOp::QueryPos => {
                    let result = store.entities_with::<(Pos,)>();
                    prop_assert!(result.len() <= alive.len());
                    // Snapshots come back sorted by entity index.
                    prop_assert!(result.windows(2).all(|w| w[0].index() < w[1].index()));
                }
                StoreOp::QueryPosVel => {
                    let result = store.entities_with::<(Pos, Vel)>();
                    prop_assert!(result.len() <= alive.len());
                    for e in result {
                        prop_assert!(store.has::<Pos>(e));
                        prop_assert!(store.has::<Vel>(e));
                    }
                }
            }

            // Invariant: entity_count matches our tracking.
            prop_assert_eq!(store.entity_count(), alive.len());

            // Invariant: all alive entities are really alive.
            for &e in &alive {
                prop_assert!(store.is_alive(e));
            }
        }
    }

    /// Verify that generational IDs catch stale references immediately.
    ///
    /// After despawning an entity, any access using the old EntityId must
    /// return None/Err (even if the index has been recycled by a new spawn).
    #[test]
    fn stale_ids_detected_after_despawn_and_recycle(
        spawn_count in 1..20usize,
        despawn_indices in prop::collection::vec(0..20usize, 1..10),
    ) {
        let mut store = setup_store();

        let mut entities: Vec<EntityId> = Vec::new();
        for i in 0..spawn_count {
            let e = store.spawn();
            store.insert(e, Pos { x: i as f32, y: 0.0 }).unwrap();
            entities.push(e);
        }

        let mut stale_ids: Vec<EntityId> = Vec::new();

        // Despawn some entities
        for &idx in &despawn_indices {
            if !entities.is_empty() {
                let idx = idx % entities.len();
                let e = entities.remove(idx);
                let _ = store.despawn(e);
                stale_ids.push(e);
            }
        }

        // Spawn new entities to recycle indices
        for _ in 0..stale_ids.len() {
            let e = store.spawn();
            store.insert(e, Pos { x: 999.0, y: 999.0 }).unwrap();
            entities.push(e);
        }

        // Verify stale IDs are still detected as stale
        for &stale in &stale_ids {
            prop_assert!(!store.is_alive(stale));
            prop_assert_eq!(store.get::<Pos>(stale), None);
        }

        // Verify alive entities are all accessible
        for &e in &entities {
            prop_assert!(store.is_alive(e));
            prop_assert!(store.get::<Pos>(e).is_some());
        }
    }

    /// Verify that insert/remove churn preserves unrelated component data.
    #[test]
    fn insert_remove_churn_preserves_data(
        initial_x in finite_f32(),
        initial_y in finite_f32(),
        vel_dx in finite_f32(),
        vel_dy in finite_f32(),
        do_remove in proptest::bool::ANY,
    ) {
        let mut store = setup_store();

        let e = store.spawn();
        store.insert(e, Pos { x: initial_x, y: initial_y }).unwrap();
        store.insert(e, Vel { dx: vel_dx, dy: vel_dy }).unwrap();

        let pos = store.get::<Pos>(e).unwrap();
        prop_assert_eq!(pos.x, initial_x);
        prop_assert_eq!(pos.y, initial_y);

        let vel = store.get::<Vel>(e).unwrap();
        prop_assert_eq!(vel.dx, vel_dx);
        prop_assert_eq!(vel.dy, vel_dy);

        if do_remove {
            store.remove::<Vel>(e).unwrap();

            // Pos must still be intact after removing Vel.
            let pos = store.get::<Pos>(e).unwrap();
            prop_assert_eq!(pos.x, initial_x);
            prop_assert_eq!(pos.y, initial_y);

            prop_assert!(!store.has::<Vel>(e));
        }
    }

    /// Verify that multiple entities maintain independent data.
    #[test]
    fn multiple_entities_independent_data(
        count in 2..50usize,
    ) {
        let mut store = setup_store();

        let mut entities = Vec::new();
        for i in 0..count {
            let e = store.spawn();
            store.insert(e, Pos { x: i as f32, y: (i * 2) as f32 }).unwrap();
            entities.push(e);
        }

        // Each entity has its own distinct data.
        for (i, &e) in entities.iter().enumerate() {
            let pos = store.get::<Pos>(e).unwrap();
            prop_assert_eq!(pos.x, i as f32);
            prop_assert_eq!(pos.y, (i * 2) as f32);
        }

        // Despawn a random middle entity and verify the rest is intact.
        if count > 2 {
            let mid = count / 2;
            let mid_e = entities.remove(mid);
            store.despawn(mid_e).unwrap();

            prop_assert_eq!(store.entity_count(), entities.len());

            for &e in &entities {
                prop_assert!(store.is_alive(e));
                prop_assert!(store.get::<Pos>(e).is_some());
            }
        }
    }
}
