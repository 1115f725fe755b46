//! Fixed-timestep frame clock.
//!
//! Hosts render at whatever rate they like; the simulation only ever
//! advances in fixed-dt ticks. The clock accumulates real frame time and
//! tells the host how many ticks to run, capping catch-up after a stall so
//! one long frame cannot snowball into ever-longer frames. The leftover
//! fraction is exposed as an interpolation alpha for rendering and never
//! feeds back into the simulation.

/// Default cap on catch-up ticks per frame.
pub const DEFAULT_MAX_STEPS: u32 = 5;

#[derive(Debug, Clone)]
pub struct FrameClock {
    fixed_dt: f32,
    accumulator: f32,
    max_steps: u32,
}

impl FrameClock {
    /// Build a clock. Panics if `fixed_dt` is not positive and finite.
    pub fn new(fixed_dt: f32) -> Self {
        assert!(
            fixed_dt.is_finite() && fixed_dt > 0.0,
            "fixed_dt must be positive and finite, got {fixed_dt}"
        );
        Self {
            fixed_dt,
            accumulator: 0.0,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Build a clock with a custom catch-up cap (at least 1).
    pub fn with_max_steps(fixed_dt: f32, max_steps: u32) -> Self {
        let mut clock = Self::new(fixed_dt);
        clock.max_steps = max_steps.max(1);
        clock
    }

    /// Feed one frame's real elapsed time; returns how many fixed ticks to
    /// run. Backlog beyond the catch-up cap is discarded.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if frame_dt.is_finite() && frame_dt > 0.0 {
            self.accumulator += frame_dt;
        }
        let steps = (self.accumulator / self.fixed_dt) as u32;
        if steps > self.max_steps {
            self.accumulator = 0.0;
            self.max_steps
        } else {
            self.accumulator -= steps as f32 * self.fixed_dt;
            steps
        }
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`. Render
    /// interpolation only.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- 1. Construction ---------------------------------------------------

    #[test]
    #[should_panic(expected = "positive and finite")]
    fn zero_dt_panics() {
        let _ = FrameClock::new(0.0);
    }

    #[test]
    #[should_panic(expected = "positive and finite")]
    fn infinite_dt_panics() {
        let _ = FrameClock::new(f32::INFINITY);
    }

    // --- 2. Accumulation ---------------------------------------------------

    #[test]
    fn short_frames_accumulate_into_ticks() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.advance(0.04), 0);
        assert_eq!(clock.advance(0.04), 0);
        assert_eq!(clock.advance(0.04), 1);
        assert!((clock.alpha() - 0.2).abs() < 1e-4);
    }

    #[test]
    fn one_frame_can_yield_multiple_ticks() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.advance(0.35), 3);
        assert!(clock.alpha() < 1.0);
    }

    #[test]
    fn negative_and_nan_frames_are_ignored() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.advance(-5.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.alpha(), 0.0);
    }

    // --- 3. Catch-up cap ---------------------------------------------------

    #[test]
    fn stalls_are_capped_and_backlog_discarded() {
        let mut clock = FrameClock::new(0.1);
        assert_eq!(clock.advance(10.0), DEFAULT_MAX_STEPS);
        // Backlog gone: the next normal frame yields a normal tick count.
        assert_eq!(clock.advance(0.1), 1);
    }

    #[test]
    fn custom_cap_is_honored() {
        let mut clock = FrameClock::with_max_steps(0.1, 2);
        assert_eq!(clock.advance(1.0), 2);
        assert_eq!(clock.advance(0.1), 1);
    }

    #[test]
    fn alpha_stays_below_one() {
        let mut clock = FrameClock::new(1.0 / 60.0);
        let mut t = 0.0;
        while t < 1.0 {
            clock.advance(0.016);
            assert!(clock.alpha() >= 0.0 && clock.alpha() < 1.0);
            t += 0.016;
        }
    }
}
