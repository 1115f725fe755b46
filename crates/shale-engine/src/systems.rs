//! The simulation systems, one function per scheduler pass.
//!
//! Systems follow a read-copy/write-back discipline against the store: copy
//! the components they need, compute, then write results back one component
//! at a time. Entities missing a component the pass needs are skipped
//! silently; numeric faults abort the pass with a [`SystemError`].

use glam::Vec2;
use shale_ecs::prelude::Store;
use shale_level::level::Level;

use crate::ai::run_behavior;
use crate::components::{
    Ai, CameraFollow, Controlled, EntityCollision, EntityHit, Hitbox, Jump, Mass, NextPosition,
    Position, Properties, PropertyFlags, State, StateFlags, Velocity, Walk, XDirection,
};
use crate::config;
use crate::scheduler::TickContext;
use crate::SystemError;

/// Advance tile animation counters.
pub fn tile_animation(
    _store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    level.tilemap.tileset.advance_animation(ctx.dt);
    Ok(())
}

/// Run one tick of every AI-driven entity's behavior.
pub fn ai(
    store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Ai,)>() {
        run_behavior(entity, store, level, ctx)?;
    }
    Ok(())
}

/// Turn the tick's input snapshot into intent on the controlled entity:
/// facing, gait flags and the jump trigger. Acceleration is applied later
/// by the movement and jump systems.
pub fn player_control(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    let input = *ctx.input;
    for entity in store.entities_with::<(Controlled, State)>() {
        let Some(state) = store.get::<State>(entity).copied() else {
            continue;
        };

        if input.jump_pressed && state.has(StateFlags::CAN_JUMP) {
            let mut direction = config::JUMP_STRAIGHT_UP;
            let mut flip = None;
            if !state.has(StateFlags::ON_GROUND)
                && state.has(StateFlags::WALL_SLIDING | StateFlags::WALL_STICKING)
            {
                // Wall jumps launch away from the wall.
                let facing = store
                    .get::<XDirection>(entity)
                    .map(|d| d.value)
                    .unwrap_or(1.0);
                if facing == 1.0 {
                    direction = config::JUMP_OFF_RIGHT_WALL;
                    flip = Some(-1.0);
                } else {
                    direction = config::JUMP_OFF_LEFT_WALL;
                    flip = Some(1.0);
                }
            }
            if let Some(jump) = store.get_mut::<Jump>(entity) {
                jump.direction = direction;
                jump.time_left = jump.duration;
            }
            if let Some(value) = flip {
                if let Some(xdir) = store.get_mut::<XDirection>(entity) {
                    xdir.value = value;
                }
            }
        }
        if input.jump_released {
            if let Some(jump) = store.get_mut::<Jump>(entity) {
                jump.time_left = 0.0;
            }
        }

        if state.has(StateFlags::CAN_MOVE) {
            if input.move_right || input.move_left {
                if let Some(xdir) = store.get_mut::<XDirection>(entity) {
                    xdir.value = if input.move_right { 1.0 } else { -1.0 };
                }
                let (add, remove) = if input.run {
                    (StateFlags::RUNNING, StateFlags::WALKING)
                } else {
                    (StateFlags::WALKING, StateFlags::RUNNING)
                };
                if let Some(state) = store.get_mut::<State>(entity) {
                    state.add(add);
                    state.remove(remove);
                }
            } else if let Some(state) = store.get_mut::<State>(entity) {
                state.remove(StateFlags::WALKING | StateFlags::RUNNING);
            }
        }
    }
    Ok(())
}

/// Bleed off velocity. The coefficient depends on what the entity is
/// touching; tiny residual speeds snap to zero so resting entities stay
/// put exactly.
pub fn drag(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Mass, Velocity, State, Properties)>() {
        let Some(state) = store.get::<State>(entity).copied() else {
            continue;
        };
        let Some(props) = store.get::<Properties>(entity).copied() else {
            continue;
        };
        if state.has(StateFlags::NO_DRAG) || props.has(PropertyFlags::FLOATING) {
            continue;
        }
        let mass = store.get::<Mass>(entity).copied().unwrap_or_default();

        let coef = if state.has(StateFlags::ON_GROUND) {
            config::GROUND_DRAG
        } else if state.has(StateFlags::WALL_SLIDING) {
            config::WALL_SLIDE_DRAG
        } else {
            config::AIR_DRAG
        };
        let factor = (1.0 - coef * config::DRAG_BASE * ctx.dt * mass.value).clamp(0.0, 1.0);

        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.x *= factor;
            vel.y *= factor;
            if vel.vec().length() < config::VELOCITY_EPSILON {
                vel.x = 0.0;
                vel.y = 0.0;
            }
        }
    }
    Ok(())
}

/// Constant downward acceleration, unless something is holding the entity
/// up (ground, wall cling, floating, ...).
pub fn gravity(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Velocity, State, Properties)>() {
        let Some(state) = store.get::<State>(entity).copied() else {
            continue;
        };
        let Some(props) = store.get::<Properties>(entity).copied() else {
            continue;
        };
        if props.has(PropertyFlags::FLOATING) || state.has(StateFlags::IGNORE_GRAVITY) {
            continue;
        }
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.y += config::GRAVITY * ctx.dt;
        }
    }
    Ok(())
}

/// Apply jump thrust while the jump timer runs, and settle the
/// JUMPING/FALLING flags when it does not.
pub fn jump(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Jump, Mass, Velocity, State)>() {
        let Some(jump) = store.get::<Jump>(entity).copied() else {
            continue;
        };
        let mass = store.get::<Mass>(entity).copied().unwrap_or_default();

        if jump.time_left > 0.0 {
            if mass.value.abs() < config::MIN_MASS {
                return Err(SystemError::DegenerateMass { entity, mass: mass.value });
            }
            if let Some(state) = store.get_mut::<State>(entity) {
                state.remove(StateFlags::CAN_JUMP);
                state.add(StateFlags::JUMPING);
            }
            let theta = jump.direction.to_radians();
            let thrust =
                Vec2::new(theta.cos(), -theta.sin()) * jump.strength / mass.value * ctx.dt;
            if let Some(vel) = store.get_mut::<Velocity>(entity) {
                vel.x += thrust.x;
                vel.y += thrust.y;
            }
            if let Some(jump) = store.get_mut::<Jump>(entity) {
                jump.time_left -= ctx.dt;
            }
        } else if let Some(state) = store.get_mut::<State>(entity) {
            state.remove(StateFlags::JUMPING);
            if !state.has(StateFlags::CAN_JUMP) {
                state.add(StateFlags::FALLING);
            } else {
                state.remove(StateFlags::FALLING);
            }
        }
    }
    Ok(())
}

/// Accelerate along the facing direction according to the current gait.
/// Airborne entities only get a fraction of their grounded authority.
pub fn movement(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Walk, XDirection, Velocity, State)>() {
        let Some(state) = store.get::<State>(entity).copied() else {
            continue;
        };
        if !state.has(StateFlags::CAN_MOVE) {
            continue;
        }
        let walk = store.get::<Walk>(entity).copied().unwrap_or_default();
        let xdir = store.get::<XDirection>(entity).copied().unwrap_or_default();

        let coef = if state.has(StateFlags::ON_GROUND) {
            1.0
        } else {
            config::AIR_CONTROL
        };
        let speed = if state.has(StateFlags::WALKING) {
            walk.walk_speed
        } else if state.has(StateFlags::RUNNING) {
            walk.run_speed
        } else {
            0.0
        };
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.x += xdir.value * coef * speed * ctx.dt;
        }
    }
    Ok(())
}

/// Integrate: where does each entity want to be next tick.
pub fn move_prediction(
    store: &mut Store,
    _level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(Position, Velocity, NextPosition)>() {
        let Some(pos) = store.get::<Position>(entity).copied() else {
            continue;
        };
        let Some(vel) = store.get::<Velocity>(entity).copied() else {
            continue;
        };
        if !vel.is_finite() {
            return Err(SystemError::NonFiniteVelocity { entity, x: vel.x, y: vel.y });
        }
        let next = pos.vec() + vel.vec() * ctx.dt;
        if let Some(slot) = store.get_mut::<NextPosition>(entity) {
            slot.set(next);
        }
    }
    Ok(())
}

/// Commit resolved next positions: position becomes authoritative again and
/// the hitbox is re-seated on it.
pub fn state_sync(
    store: &mut Store,
    _level: &mut Level,
    _ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(NextPosition, Position, Hitbox)>() {
        let Some(next) = store.get::<NextPosition>(entity).copied() else {
            continue;
        };
        if let Some(pos) = store.get_mut::<Position>(entity) {
            pos.set(next.vec());
        }
        if let Some(hitbox) = store.get_mut::<Hitbox>(entity) {
            hitbox.set_center(next.vec());
        }
    }
    Ok(())
}

/// Record entity-vs-entity overlaps. Contact side is picked per pair from
/// the shallower penetration axis; phasable entities never register.
pub fn entity_collisions(
    store: &mut Store,
    _level: &mut Level,
    _ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    let entities = store.entities_with::<(EntityCollision, Hitbox)>();

    let mut bodies = Vec::with_capacity(entities.len());
    for &entity in &entities {
        if let Some(col) = store.get_mut::<EntityCollision>(entity) {
            col.reset();
        }
        let phasable = store
            .get::<Properties>(entity)
            .map(|p| p.has(PropertyFlags::PHASABLE))
            .unwrap_or(false);
        if phasable {
            continue;
        }
        if let Some(hitbox) = store.get::<Hitbox>(entity).copied() {
            bodies.push((entity, hitbox.rect()));
        }
    }

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (a, rect_a) = bodies[i];
            let (b, rect_b) = bodies[j];
            if !rect_a.overlaps(&rect_b) {
                continue;
            }
            let pen_x = rect_a.right().min(rect_b.right()) - rect_a.left.max(rect_b.left);
            let pen_y = rect_a.bottom().min(rect_b.bottom()) - rect_a.top.max(rect_b.top);

            // Sides as seen from `a`; `b` gets the mirror.
            let (left, right, top, bottom) = if pen_x < pen_y {
                let b_to_the_right = rect_b.center().0 > rect_a.center().0;
                (!b_to_the_right, b_to_the_right, false, false)
            } else {
                let b_below = rect_b.center().1 > rect_a.center().1;
                (false, false, !b_below, b_below)
            };

            if let Some(col) = store.get_mut::<EntityCollision>(a) {
                col.left |= left;
                col.right |= right;
                col.top |= top;
                col.bottom |= bottom;
                col.hits.push(EntityHit { entity: b, left, right, top, bottom });
            }
            if let Some(col) = store.get_mut::<EntityCollision>(b) {
                col.left |= right;
                col.right |= left;
                col.top |= bottom;
                col.bottom |= top;
                col.hits
                    .push(EntityHit { entity: a, left: right, right: left, top: bottom, bottom: top });
            }
        }
    }
    Ok(())
}

/// Grounded entities cannot also be clinging to or sliding down a wall.
pub fn state_flag_cleanup(
    store: &mut Store,
    _level: &mut Level,
    _ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(State,)>() {
        if let Some(state) = store.get_mut::<State>(entity) {
            if state.has(StateFlags::ON_GROUND) {
                state.remove(StateFlags::WALL_STICKING | StateFlags::WALL_SLIDING);
            }
        }
    }
    Ok(())
}

/// Damped deadzone camera follow, clamped to the map.
///
/// Only the first followed entity (lowest index) drives the camera.
pub fn camera(
    store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    let Some(&entity) = store.entities_with::<(CameraFollow, Hitbox)>().first() else {
        return Ok(());
    };
    let Some(follow) = store.get::<CameraFollow>(entity).copied() else {
        return Ok(());
    };
    let Some(target) = store.get::<Hitbox>(entity).map(Hitbox::center) else {
        return Ok(());
    };

    let cam = &mut level.camera;
    let half_dz = Vec2::new(follow.deadzone[0] as f32 / 2.0, follow.deadzone[1] as f32 / 2.0);

    let mut desired = cam.pos;
    if target.x > cam.pos.x + half_dz.x {
        desired.x = target.x - half_dz.x;
    } else if target.x < cam.pos.x - half_dz.x {
        desired.x = target.x + half_dz.x;
    }
    if target.y > cam.pos.y + half_dz.y {
        desired.y = target.y - half_dz.y;
    } else if target.y < cam.pos.y - half_dz.y {
        desired.y = target.y + half_dz.y;
    }

    let t = (ctx.dt * follow.damping).min(1.0);
    let mut pos = cam.pos.lerp(desired, t);

    let map_w = level.tilemap.pixel_width() as f32;
    let map_h = level.tilemap.pixel_height() as f32;
    let half_w = cam.width as f32 / 2.0;
    let half_h = cam.height as f32 / 2.0;
    pos.x = if map_w < cam.width as f32 {
        map_w / 2.0
    } else {
        pos.x.clamp(half_w, map_w - half_w)
    };
    pos.y = if map_h < cam.height as f32 {
        map_h / 2.0
    } else {
        pos.y.clamp(half_h, map_h - half_h)
    };

    cam.pos = pos;
    Ok(())
}
