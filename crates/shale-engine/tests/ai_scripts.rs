//! Scripted behavior over the full system stack.

mod common;

use common::*;
use shale_engine::ai::{AiBehavior, AiCommand, AiCondition, AiPage, CompareOp};
use shale_engine::prelude::*;

fn arena() -> Vec<&'static str> {
    vec![
        "............",
        "............",
        "............",
        "............",
        "............",
        "............",
        "############",
        "############",
    ]
}

fn spawn_npc(engine: &mut Engine, x: f32, behavior: AiBehavior) -> shale_ecs::prelude::EntityId {
    let npc = spawn_actor(&mut engine.store, x, 268.0);
    engine
        .store
        .insert(npc, Ai { behavior, ..Default::default() })
        .unwrap();
    npc
}

// --- 1. Idle ----------------------------------------------------------------

#[test]
fn idle_npc_hops_when_the_dice_say_so() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    // Certain hop: the first grounded tick must arm a jump.
    let npc = spawn_npc(&mut engine, 100.0, AiBehavior::Idle { jump_chance: 1.0 });

    let mut hopped = false;
    for _ in 0..120 {
        engine.tick(&mut level);
        if engine.store.get::<Velocity>(npc).unwrap().y < 0.0 {
            hopped = true;
            break;
        }
    }
    assert!(hopped, "idle npc never hopped");
    assert_eq!(engine.store.get::<Jump>(npc).unwrap().direction, 90.0);
}

#[test]
fn idle_npc_with_zero_chance_stays_put() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    let npc = spawn_npc(&mut engine, 100.0, AiBehavior::Idle { jump_chance: 0.0 });

    engine.run_ticks(&mut level, 240);
    assert!(state_of(&engine.store, npc).has(StateFlags::ON_GROUND));
    assert_eq!(engine.store.get::<Jump>(npc).unwrap().time_left, 0.0);
}

// --- 2. Page selection -------------------------------------------------------

#[test]
fn first_true_page_wins_and_switching_resets_the_cursor() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);

    // Page 0 triggers only near the player; page 1 always.
    let behavior = AiBehavior::Scripted {
        pages: vec![
            AiPage {
                condition: AiCondition::DistanceToPlayer { op: CompareOp::Lt, distance: 100.0 },
                commands: vec![AiCommand::SetFlag {
                    flag: StateFlags::SHIELDED,
                    on: true,
                }],
            },
            AiPage {
                condition: AiCondition::Always,
                commands: vec![AiCommand::Wait { duration: 1000.0 }],
            },
        ],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);
    let player = spawn_actor(&mut engine.store, 400.0, 268.0);
    level.player = Some(player);

    engine.run_ticks(&mut level, 10);
    // Far away: page 1 is active, parked in its long wait.
    assert_eq!(engine.store.get::<Ai>(npc).unwrap().page, Some(1));
    assert!(!state_of(&engine.store, npc).has(StateFlags::SHIELDED));

    // Teleport the player close; page 0 takes over with a fresh cursor.
    engine.store.get_mut::<Position>(player).unwrap().x = 120.0;
    engine.store.get_mut::<Hitbox>(player).unwrap().x = 120.0;
    engine.store.get_mut::<NextPosition>(player).unwrap().x = 120.0;
    engine.tick(&mut level);

    let ai = engine.store.get::<Ai>(npc).unwrap();
    assert_eq!(ai.page, Some(0));
    assert!(state_of(&engine.store, npc).has(StateFlags::SHIELDED));
}

#[test]
fn no_matching_page_means_no_commands_run() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    let behavior = AiBehavior::Scripted {
        pages: vec![AiPage {
            condition: AiCondition::Never,
            commands: vec![AiCommand::SetFlag { flag: StateFlags::SHIELDED, on: true }],
        }],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);

    engine.run_ticks(&mut level, 60);
    assert_eq!(engine.store.get::<Ai>(npc).unwrap().page, None);
    assert!(!state_of(&engine.store, npc).has(StateFlags::SHIELDED));
}

// --- 3. Commands -------------------------------------------------------------

#[test]
fn wait_blocks_for_its_duration() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    let behavior = AiBehavior::Scripted {
        pages: vec![AiPage {
            condition: AiCondition::Always,
            commands: vec![
                AiCommand::Wait { duration: 0.5 },
                AiCommand::SetFlag { flag: StateFlags::SHIELDED, on: true },
            ],
        }],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);

    engine.run_ticks(&mut level, 20);
    assert!(!state_of(&engine.store, npc).has(StateFlags::SHIELDED), "woke early");
    engine.run_ticks(&mut level, 20);
    assert!(state_of(&engine.store, npc).has(StateFlags::SHIELDED));
}

#[test]
fn goto_loops_the_page() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    // Toggle SHIELDED forever: on, wait, off, wait, goto 0.
    let behavior = AiBehavior::Scripted {
        pages: vec![AiPage {
            condition: AiCondition::Always,
            commands: vec![
                AiCommand::SetFlag { flag: StateFlags::SHIELDED, on: true },
                AiCommand::Wait { duration: 0.1 },
                AiCommand::SetFlag { flag: StateFlags::SHIELDED, on: false },
                AiCommand::Wait { duration: 0.1 },
                AiCommand::Goto { index: 0 },
            ],
        }],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);

    let mut transitions = 0;
    let mut last = false;
    for _ in 0..240 {
        engine.tick(&mut level);
        let now = state_of(&engine.store, npc).has(StateFlags::SHIELDED);
        if now != last {
            transitions += 1;
            last = now;
        }
    }
    assert!(transitions >= 4, "script never looped: {transitions} transitions");
}

#[test]
fn move_to_walks_there_and_stops() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    let behavior = AiBehavior::Scripted {
        pages: vec![AiPage {
            condition: AiCondition::Always,
            commands: vec![
                AiCommand::MoveTo { x: 400.0, y: 268.0 },
                AiCommand::Wait { duration: 1000.0 },
            ],
        }],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);

    engine.run_ticks(&mut level, 600);

    let pos = engine.store.get::<Position>(npc).unwrap();
    assert!((pos.x - 400.0).abs() <= 3.0, "stopped at {}", pos.x);
    assert_eq!(engine.store.get::<Velocity>(npc).unwrap().x, 0.0);
    assert!(!state_of(&engine.store, npc).has(StateFlags::WALKING));
    // Parked on the wait command after arriving.
    assert_eq!(engine.store.get::<Ai>(npc).unwrap().command_index, 1);
}

#[test]
fn jump_command_blocks_until_landing() {
    let mut engine = engine();
    let mut level = level_from_ascii(&arena(), &SYSTEM_PRIORITY);
    let behavior = AiBehavior::Scripted {
        pages: vec![AiPage {
            condition: AiCondition::Always,
            commands: vec![
                AiCommand::Jump,
                AiCommand::SetFlag { flag: StateFlags::SHIELDED, on: true },
            ],
        }],
    };
    let npc = spawn_npc(&mut engine, 100.0, behavior);
    // A modest authored strength keeps the whole arc inside the test budget.
    engine
        .store
        .insert(npc, Jump { strength: 6.0e3, ..Default::default() })
        .unwrap();

    // While airborne the follow-up command must not have run.
    let mut was_airborne = false;
    let mut landed_and_advanced = false;
    for _ in 0..900 {
        engine.tick(&mut level);
        let state = state_of(&engine.store, npc);
        if state.has(StateFlags::JUMPING | StateFlags::FALLING) {
            was_airborne = true;
            assert!(!state.has(StateFlags::SHIELDED), "advanced mid-air");
        }
        if was_airborne && state.has(StateFlags::SHIELDED) {
            landed_and_advanced = true;
            break;
        }
    }
    assert!(was_airborne, "jump command never left the ground");
    assert!(landed_and_advanced, "never advanced after landing");
}
