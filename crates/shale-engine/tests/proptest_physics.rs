//! Property tests: collision resolution never leaves an actor embedded in
//! or beyond the walls, whatever the starting velocity.

mod common;

use common::*;
use proptest::prelude::*;
use shale_engine::prelude::*;

/// A sealed box: solid border, open interior.
fn sealed_box() -> Vec<&'static str> {
    vec![
        "############",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "#..........#",
        "############",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any launch velocity up to ~70 px/tick: the actor must never end a
    /// tick overlapping a solid tile or outside the box.
    #[test]
    fn actor_never_embeds_in_the_walls(
        vx in -3000.0f32..3000.0,
        vy in -3000.0f32..3000.0,
        x in 150.0f32..420.0,
        y in 100.0f32..280.0,
    ) {
        let mut engine = engine();
        let mut level = level_from_ascii(&sealed_box(), &SYSTEM_PRIORITY);
        let actor = spawn_actor(&mut engine.store, x, y);
        {
            let vel = engine.store.get_mut::<Velocity>(actor).unwrap();
            vel.x = vx;
            vel.y = vy;
        }
        prop_assume!(!level.tilemap.rect_collides(&rect_of(&engine.store, actor)));

        for _ in 0..200 {
            engine.tick(&mut level);
            let rect = rect_of(&engine.store, actor);
            prop_assert!(
                !level.tilemap.rect_collides(&rect),
                "embedded in a wall: {:?}",
                rect
            );
            prop_assert!(rect.left >= 48 && rect.right() <= 528, "escaped: {:?}", rect);
            prop_assert!(rect.top >= 48 && rect.bottom() <= 336, "escaped: {:?}", rect);
        }
    }

    /// Whatever happens inside the box, the actor ends up at rest on the
    /// floor once its velocity has bled off.
    #[test]
    fn actor_eventually_comes_to_rest(
        vx in -1500.0f32..1500.0,
        vy in -1500.0f32..1500.0,
    ) {
        let mut engine = engine();
        let mut level = level_from_ascii(&sealed_box(), &SYSTEM_PRIORITY);
        let actor = spawn_actor(&mut engine.store, 288.0, 150.0);
        {
            let vel = engine.store.get_mut::<Velocity>(actor).unwrap();
            vel.x = vx;
            vel.y = vy;
        }

        for _ in 0..1200 {
            engine.tick(&mut level);
        }
        let state = state_of(&engine.store, actor);
        prop_assert!(state.has(StateFlags::ON_GROUND));
        prop_assert_eq!(rect_of(&engine.store, actor).bottom(), 336);
        prop_assert_eq!(engine.store.get::<Velocity>(actor).unwrap().y, 0.0);
    }
}
