//! The tick scheduler: named system passes in a fixed priority order.
//!
//! Systems are plain functions registered under a name. A level opts into
//! passes by name; the scheduler runs the registered passes the level
//! names, always in registration order, so levels can disable passes but
//! never reorder them. A pass that returns an error is logged and skipped
//! for the rest of the tick; the tick itself always completes.

use rand::SeedableRng;
use rand_pcg::Pcg64;
use shale_ecs::prelude::Store;
use shale_level::level::Level;

use crate::input::InputSnapshot;
use crate::{collision, systems, SystemError};

/// Canonical pass order. Levels that want "everything" list exactly this.
pub const SYSTEM_PRIORITY: [&str; 13] = [
    "TileAnimation",
    "Ai",
    "PlayerControl",
    "Drag",
    "Gravity",
    "Jump",
    "Movement",
    "MovePrediction",
    "MapCollision",
    "StateSync",
    "EntityCollisions",
    "StateFlagCleanup",
    "Camera",
];

/// Per-tick state handed to every system pass.
pub struct TickContext<'a> {
    /// Fixed timestep, seconds.
    pub dt: f32,
    /// The tick's input snapshot.
    pub input: &'a InputSnapshot,
    /// Seeded simulation PRNG. All randomness flows through here.
    pub rng: &'a mut Pcg64,
}

/// A system pass: plain function, no captured state.
pub type SystemFn = fn(&mut Store, &mut Level, &mut TickContext<'_>) -> Result<(), SystemError>;

struct RegisteredSystem {
    name: &'static str,
    func: SystemFn,
}

/// The simulation driver: a store, the registered passes, a seeded PRNG
/// and a tick counter.
///
/// Simulation time is derived from the tick counter rather than summed
/// float deltas, so it cannot drift over long runs.
pub struct Engine {
    pub store: Store,
    systems: Vec<RegisteredSystem>,
    fixed_dt: f32,
    tick_count: u64,
    rng: Pcg64,
    input: InputSnapshot,
}

impl Engine {
    /// Build an engine with no passes registered.
    ///
    /// Panics if `fixed_dt` is not positive and finite.
    pub fn new(store: Store, fixed_dt: f32, seed: u64) -> Self {
        assert!(
            fixed_dt.is_finite() && fixed_dt > 0.0,
            "fixed_dt must be positive and finite, got {fixed_dt}"
        );
        Self {
            store,
            systems: Vec::new(),
            fixed_dt,
            tick_count: 0,
            rng: Pcg64::seed_from_u64(seed),
            input: InputSnapshot::default(),
        }
    }

    /// Build an engine with the full built-in pass set, in priority order.
    pub fn with_builtin_systems(store: Store, fixed_dt: f32, seed: u64) -> Self {
        let mut engine = Self::new(store, fixed_dt, seed);
        engine.add_system("TileAnimation", systems::tile_animation);
        engine.add_system("Ai", systems::ai);
        engine.add_system("PlayerControl", systems::player_control);
        engine.add_system("Drag", systems::drag);
        engine.add_system("Gravity", systems::gravity);
        engine.add_system("Jump", systems::jump);
        engine.add_system("Movement", systems::movement);
        engine.add_system("MovePrediction", systems::move_prediction);
        engine.add_system("MapCollision", collision::map_collision);
        engine.add_system("StateSync", systems::state_sync);
        engine.add_system("EntityCollisions", systems::entity_collisions);
        engine.add_system("StateFlagCleanup", systems::state_flag_cleanup);
        engine.add_system("Camera", systems::camera);
        engine
    }

    /// Register a pass. Registration order is execution order.
    ///
    /// Panics on duplicate names.
    pub fn add_system(&mut self, name: &'static str, func: SystemFn) {
        assert!(
            self.systems.iter().all(|s| s.name != name),
            "system {name:?} registered twice"
        );
        self.systems.push(RegisteredSystem { name, func });
    }

    /// Whether a pass is registered under `name`.
    pub fn has_system(&self, name: &str) -> bool {
        self.systems.iter().any(|s| s.name == name)
    }

    /// Stage the input snapshot for the next tick. Consumed by [`tick`];
    /// edges do not repeat across ticks.
    ///
    /// [`tick`]: Engine::tick
    pub fn set_input(&mut self, input: InputSnapshot) {
        self.input = input;
    }

    /// Run one fixed-dt tick over `level`.
    pub fn tick(&mut self, level: &mut Level) {
        if self.tick_count == 0 {
            for name in &level.systems {
                if !self.has_system(name) {
                    tracing::warn!(system = %name, "level names an unregistered system");
                }
            }
        }

        let input = self.input;
        let mut ctx = TickContext {
            dt: self.fixed_dt,
            input: &input,
            rng: &mut self.rng,
        };
        for system in &self.systems {
            if !level.runs_system(system.name) {
                continue;
            }
            if let Err(error) = (system.func)(&mut self.store, level, &mut ctx) {
                tracing::warn!(system = system.name, %error, "system pass aborted");
            }
        }

        self.tick_count += 1;
        self.input = InputSnapshot::default();
    }

    /// Run `count` ticks with whatever input is staged for the first one.
    pub fn run_ticks(&mut self, level: &mut Level, count: u64) {
        for _ in 0..count {
            self.tick(level);
        }
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulation time, derived from the tick counter.
    pub fn sim_time(&self) -> f64 {
        self.tick_count as f64 * self.fixed_dt as f64
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("systems", &self.systems.len())
            .field("fixed_dt", &self.fixed_dt)
            .field("tick_count", &self.tick_count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
