//! Scripted entity behavior.
//!
//! A behavior is either `Idle` (occasional random hops) or `Scripted`: an
//! ordered list of pages, each a trigger condition plus a command list. Every
//! tick the interpreter picks the first page whose condition holds; switching
//! pages resets the command cursor. Commands run one per tick at most, and a
//! command keeps the cursor until it reports completion, so multi-tick
//! commands (wait, jump, move-to) resume where they left off.
//!
//! Behaviors are data: closed enums deserialized from blueprint documents,
//! with no callbacks or host scripting involved.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shale_ecs::prelude::{EntityId, Store};
use shale_level::level::Level;

use crate::components::{
    Ai, Hitbox, Jump, MapCollision, NextPosition, Position, State, StateFlags, Velocity, Walk,
    XDirection,
};
use crate::config;
use crate::scheduler::TickContext;
use crate::SystemError;

// ---------------------------------------------------------------------------
// Behavior documents
// ---------------------------------------------------------------------------

fn default_jump_chance() -> f32 {
    0.01
}

fn default_wait() -> f32 {
    1.0
}

fn default_on() -> bool {
    true
}

/// What an AI-driven entity does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AiBehavior {
    /// Hop straight up now and then, when a jump is possible.
    Idle {
        /// Per-tick probability of hopping.
        #[serde(default = "default_jump_chance")]
        jump_chance: f32,
    },
    /// Run a page script.
    Scripted { pages: Vec<AiPage> },
}

impl Default for AiBehavior {
    fn default() -> Self {
        AiBehavior::Idle { jump_chance: default_jump_chance() }
    }
}

/// One script page: a trigger and the commands to run while it holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiPage {
    pub condition: AiCondition,
    pub commands: Vec<AiCommand>,
}

impl<'de> Deserialize<'de> for AiPage {
    /// Deserializes the page and validates every `goto` target against the
    /// page's command count, so a dangling index fails at document load.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct PageDoc {
            condition: AiCondition,
            commands: Vec<AiCommand>,
        }

        let doc = PageDoc::deserialize(deserializer)?;
        for (at, command) in doc.commands.iter().enumerate() {
            if let AiCommand::Goto { index } = command {
                if *index >= doc.commands.len() {
                    return Err(serde::de::Error::custom(format!(
                        "goto at command {at} targets index {index}, page has {} commands",
                        doc.commands.len()
                    )));
                }
            }
        }
        Ok(AiPage { condition: doc.condition, commands: doc.commands })
    }
}

/// Page trigger conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AiCondition {
    Always,
    Never,
    Not { condition: Box<AiCondition> },
    All { conditions: Vec<AiCondition> },
    Any { conditions: Vec<AiCondition> },
    /// Any overlapping bit of the entity's state flags.
    HasFlag { flag: StateFlags },
    /// A map contact on the given side this tick.
    CollisionAt { side: CollisionSide },
    /// Compare the center-to-center distance to the player.
    DistanceToPlayer { op: CompareOp, distance: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionSide {
    Left,
    Right,
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    pub fn compare(self, lhs: f32, rhs: f32) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
        }
    }
}

/// Script commands. A command either finishes this tick (the cursor
/// advances) or keeps running (the cursor stays).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum AiCommand {
    /// Block for `duration` seconds.
    Wait {
        #[serde(default = "default_wait")]
        duration: f32,
    },
    /// Move the cursor to `index` within the page.
    Goto { index: usize },
    /// Set or clear state flags.
    SetFlag {
        flag: StateFlags,
        #[serde(default = "default_on")]
        on: bool,
    },
    /// Start a straight-up jump if possible, without waiting for it.
    InitiateJump,
    /// Jump and block until back on the ground.
    Jump,
    /// Walk to an x coordinate, decelerating into the stop.
    MoveTo { x: f32, y: f32 },
    /// Walk toward the player's current position.
    MoveToPlayer,
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

enum Outcome {
    /// Keep the cursor on this command next tick.
    Running,
    /// Move the cursor to the next command.
    Advance,
}

/// Run one tick of an entity's behavior.
pub fn run_behavior(
    entity: EntityId,
    store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    let Some(mut ai) = store.get::<Ai>(entity).cloned() else {
        return Ok(());
    };

    match ai.behavior.clone() {
        AiBehavior::Idle { jump_chance } => {
            let state = store.get::<State>(entity).copied().unwrap_or_default();
            if ctx.rng.gen::<f32>() < jump_chance && state.has(StateFlags::CAN_JUMP) {
                start_jump(entity, store);
            }
        }
        AiBehavior::Scripted { pages } => {
            let active = pages
                .iter()
                .position(|page| eval_condition(&page.condition, entity, store, level));
            if active != ai.page {
                ai.page = active;
                ai.command_index = 0;
                ai.wait_timer = 0.0;
            }
            if let Some(page_index) = ai.page {
                let page = &pages[page_index];
                if ai.command_index < page.commands.len() {
                    let command = page.commands[ai.command_index].clone();
                    match run_command(&command, entity, store, level, ctx, &mut ai)? {
                        Outcome::Advance => ai.command_index += 1,
                        Outcome::Running => {}
                    }
                } else {
                    // Page exhausted, loop from the top.
                    ai.command_index = 0;
                }
            }
        }
    }

    if let Some(slot) = store.get_mut::<Ai>(entity) {
        slot.page = ai.page;
        slot.command_index = ai.command_index;
        slot.wait_timer = ai.wait_timer;
        slot.airborne = ai.airborne;
    }
    Ok(())
}

fn run_command(
    command: &AiCommand,
    entity: EntityId,
    store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
    ai: &mut Ai,
) -> Result<Outcome, SystemError> {
    match command {
        AiCommand::Wait { duration } => {
            ai.wait_timer += ctx.dt;
            if ai.wait_timer >= *duration {
                ai.wait_timer = 0.0;
                Ok(Outcome::Advance)
            } else {
                Ok(Outcome::Running)
            }
        }
        AiCommand::Goto { index } => {
            ai.command_index = *index;
            Ok(Outcome::Running)
        }
        AiCommand::SetFlag { flag, on } => {
            if let Some(state) = store.get_mut::<State>(entity) {
                if *on {
                    state.add(*flag);
                } else {
                    state.remove(*flag);
                }
            }
            Ok(Outcome::Advance)
        }
        AiCommand::InitiateJump => {
            let state = store.get::<State>(entity).copied().unwrap_or_default();
            if state.has(StateFlags::CAN_JUMP) {
                start_jump(entity, store);
            }
            Ok(Outcome::Advance)
        }
        AiCommand::Jump => {
            let state = store.get::<State>(entity).copied().unwrap_or_default();
            if !ai.airborne {
                if state.has(StateFlags::CAN_JUMP) {
                    start_jump(entity, store);
                    ai.airborne = true;
                }
                Ok(Outcome::Running)
            } else if state.has(StateFlags::ON_GROUND) {
                ai.airborne = false;
                Ok(Outcome::Advance)
            } else {
                Ok(Outcome::Running)
            }
        }
        AiCommand::MoveTo { x, .. } => {
            let arrived = walk_toward(entity, store, *x, ctx.dt, true);
            Ok(if arrived { Outcome::Advance } else { Outcome::Running })
        }
        AiCommand::MoveToPlayer => {
            let Some(target) = player_center(store, level) else {
                return Ok(Outcome::Advance);
            };
            let arrived = walk_toward(entity, store, target.x, ctx.dt, false);
            Ok(if arrived { Outcome::Advance } else { Outcome::Running })
        }
    }
}

/// Arm a straight-up jump; the jump system applies the force.
fn start_jump(entity: EntityId, store: &mut Store) {
    if let Some(jump) = store.get_mut::<Jump>(entity) {
        jump.direction = config::JUMP_STRAIGHT_UP;
        jump.time_left = jump.duration;
    }
}

/// One tick of trapezoidal walk toward `target_x`. Accelerates up to the
/// walk speed, brakes inside the stopping distance, and reports arrival
/// within a 2px tolerance. `snap` pins the position exactly on arrival.
fn walk_toward(entity: EntityId, store: &mut Store, target_x: f32, dt: f32, snap: bool) -> bool {
    const TOLERANCE: f32 = 2.0;

    let Some(pos) = store.get::<Position>(entity).copied() else {
        return true;
    };
    let vel = store.get::<Velocity>(entity).copied().unwrap_or_default();
    let walk = store.get::<Walk>(entity).copied().unwrap_or_default();

    let dx = target_x - pos.x;
    if dx.abs() <= TOLERANCE {
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.x = 0.0;
        }
        if let Some(state) = store.get_mut::<State>(entity) {
            state.remove(StateFlags::WALKING | StateFlags::RUNNING);
        }
        if snap {
            if let Some(pos) = store.get_mut::<Position>(entity) {
                pos.x = target_x;
            }
            if let Some(hitbox) = store.get_mut::<Hitbox>(entity) {
                hitbox.x = target_x;
            }
            if let Some(next) = store.get_mut::<NextPosition>(entity) {
                next.x = target_x;
            }
        }
        return true;
    }

    let dir = dx.signum();
    let max_speed = walk.walk_speed;
    let accel = max_speed * 4.0;
    let decel = max_speed * 6.0;

    let mut vx = vel.x;
    let stopping_dist = vx * vx / (2.0 * decel);
    if vx * dir > 0.0 && dx.abs() <= stopping_dist {
        // Brake into the stop.
        vx -= dir * decel * dt;
        if vx * dir < 0.0 {
            vx = 0.0;
        }
    } else {
        vx += dir * accel * dt;
        vx = vx.clamp(-max_speed, max_speed);
    }

    if let Some(vel) = store.get_mut::<Velocity>(entity) {
        vel.x = vx;
    }
    if let Some(xdir) = store.get_mut::<XDirection>(entity) {
        xdir.value = dir;
    }
    if let Some(state) = store.get_mut::<State>(entity) {
        state.add(StateFlags::WALKING);
    }
    false
}

fn player_center(store: &Store, level: &Level) -> Option<Vec2> {
    let player = level.player?;
    store.get::<Hitbox>(player).map(Hitbox::center)
}

fn eval_condition(cond: &AiCondition, entity: EntityId, store: &Store, level: &Level) -> bool {
    match cond {
        AiCondition::Always => true,
        AiCondition::Never => false,
        AiCondition::Not { condition } => !eval_condition(condition, entity, store, level),
        AiCondition::All { conditions } => conditions
            .iter()
            .all(|c| eval_condition(c, entity, store, level)),
        AiCondition::Any { conditions } => conditions
            .iter()
            .any(|c| eval_condition(c, entity, store, level)),
        AiCondition::HasFlag { flag } => store
            .get::<State>(entity)
            .map(|s| s.has(*flag))
            .unwrap_or(false),
        AiCondition::CollisionAt { side } => store
            .get::<MapCollision>(entity)
            .map(|col| match side {
                CollisionSide::Left => col.left,
                CollisionSide::Right => col.right,
                CollisionSide::Top => col.top,
                CollisionSide::Bottom => col.bottom,
            })
            .unwrap_or(false),
        AiCondition::DistanceToPlayer { op, distance } => {
            let Some(target) = player_center(store, level) else {
                return false;
            };
            let Some(here) = store.get::<Hitbox>(entity).map(Hitbox::center) else {
                return false;
            };
            op.compare(here.distance(target), *distance)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
