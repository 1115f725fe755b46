//! Map collision resolution.
//!
//! A backward sweep on the integer pixel grid: start the collision box at
//! the predicted position and walk it back along the motion vector one
//! pixel at a time until it no longer overlaps a solid tile. Entities land
//! flush against tile edges, which together with edge-exclusive overlap
//! tests makes resting contact a fixed point: an entity at rest resolves to
//! exactly where it already is, tick after tick.
//!
//! The same pass owns the contact side effects: zeroing velocity into
//! walls and floors, the wall stick/slide state machine, and the small
//! downward bounce off ceilings.

use glam::Vec2;
use shale_ecs::prelude::{EntityId, Store};
use shale_level::level::Level;
use shale_level::tilemap::TouchSides;

use crate::components::{
    Hitbox, MapCollision, NextPosition, State, StateFlags, Velocity, WallSticking, XDirection,
};
use crate::config;
use crate::scheduler::TickContext;
use crate::SystemError;

/// Resolve predicted positions against the tile grid and update contact
/// state.
pub fn map_collision(
    store: &mut Store,
    level: &mut Level,
    ctx: &mut TickContext<'_>,
) -> Result<(), SystemError> {
    for entity in store.entities_with::<(MapCollision, Hitbox, NextPosition, Velocity, XDirection)>()
    {
        let Some(hitbox) = store.get::<Hitbox>(entity).copied() else {
            continue;
        };
        let Some(next) = store.get::<NextPosition>(entity).copied() else {
            continue;
        };
        let Some(xdir) = store.get::<XDirection>(entity).copied() else {
            continue;
        };
        let Some(state) = store.get::<State>(entity).copied() else {
            continue;
        };

        let base = hitbox.center();
        let mut d = next.vec() - base;
        let mut rect = hitbox.rect();
        rect.set_center(next.vec());

        // Walk back along the motion vector until clear. `d . step` shrinks
        // by one per iteration, so the loop runs at most |d| times.
        let step = if d.length_squared() > 0.0 {
            d.normalize()
        } else {
            Vec2::ZERO
        };
        while d.dot(step) > 0.0 && level.tilemap.rect_collides(&rect) {
            d -= step;
            let center = rect.center_f() - step;
            rect.set_center(center);
        }
        if level.tilemap.rect_collides(&rect) {
            // Still stuck (spawned inside a wall, or motion too tangled to
            // unwind): hold the previous position.
            rect = hitbox.rect();
        }

        let touch = level.tilemap.touching(&rect);
        if let Some(col) = store.get_mut::<MapCollision>(entity) {
            col.left = touch.left;
            col.right = touch.right;
            col.top = touch.top;
            col.bottom = touch.bottom;
        }
        if let Some(slot) = store.get_mut::<NextPosition>(entity) {
            slot.set(rect.center_f());
        }

        apply_contact_effects(entity, store, &touch, state, xdir.value, ctx.dt);
    }
    Ok(())
}

/// Contact side effects: velocity zeroing, wall stick/slide, grounding and
/// the ceiling bounce.
fn apply_contact_effects(
    entity: EntityId,
    store: &mut Store,
    touch: &TouchSides,
    state: State,
    facing: f32,
    dt: f32,
) {
    let vertical_contact = touch.top || touch.bottom;
    let can_cling = !vertical_contact
        && !state.has(StateFlags::JUMPING)
        && store.has::<WallSticking>(entity);

    if touch.right {
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.x = 0.0;
        }
        if facing == 1.0 && can_cling {
            wall_cling(entity, store, dt);
        }
    } else if touch.left {
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.x = 0.0;
        }
        if facing == -1.0 && can_cling {
            wall_cling(entity, store, dt);
        }
    } else if let Some(state) = store.get_mut::<State>(entity) {
        state.remove(StateFlags::WALL_STICKING | StateFlags::WALL_SLIDING);
    }

    if touch.bottom {
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.y = 0.0;
        }
        if let Some(state) = store.get_mut::<State>(entity) {
            state.add(StateFlags::ON_GROUND);
        }
    } else if let Some(state) = store.get_mut::<State>(entity) {
        state.remove(StateFlags::ON_GROUND);
    }

    if touch.top {
        // Head bump: push back down instead of hovering under the ceiling.
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.y = config::CEILING_BOUNCE;
        }
    }
}

/// Wall cling state machine: grab the wall, hold for the stick duration,
/// then transition to sliding.
fn wall_cling(entity: EntityId, store: &mut Store, dt: f32) {
    let Some(sticking) = store.get::<WallSticking>(entity).copied() else {
        return;
    };
    let Some(state) = store.get::<State>(entity).copied() else {
        return;
    };

    if !state.has(StateFlags::WALL_STICKING | StateFlags::WALL_SLIDING) {
        if let Some(state) = store.get_mut::<State>(entity) {
            state.add(StateFlags::WALL_STICKING);
        }
        if let Some(slot) = store.get_mut::<WallSticking>(entity) {
            slot.time_left = slot.duration;
        }
        if let Some(vel) = store.get_mut::<Velocity>(entity) {
            vel.y = 0.0;
        }
    } else if sticking.time_left > 0.0 {
        if let Some(slot) = store.get_mut::<WallSticking>(entity) {
            slot.time_left -= dt;
        }
    } else if let Some(state) = store.get_mut::<State>(entity) {
        state.remove(StateFlags::WALL_STICKING);
        state.add(StateFlags::WALL_SLIDING);
    }
}
