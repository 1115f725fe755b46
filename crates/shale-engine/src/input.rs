//! Plain-data input consumed by the control system.
//!
//! The host samples whatever real devices it has and hands the engine one
//! snapshot per tick. `jump_pressed` and `jump_released` are edges, not
//! levels: they fire on the tick the button changed.

use serde::{Deserialize, Serialize};

/// One tick's worth of player intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    pub move_left: bool,
    pub move_right: bool,
    /// Held to run instead of walk.
    pub run: bool,
    pub jump_pressed: bool,
    pub jump_released: bool,
}

impl InputSnapshot {
    /// A snapshot with nothing held. Same as `Default`, spelled for tests.
    pub fn idle() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_all_false() {
        let snap = InputSnapshot::idle();
        assert!(!snap.move_left && !snap.move_right && !snap.run);
        assert!(!snap.jump_pressed && !snap.jump_released);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let snap = InputSnapshot { move_right: true, jump_pressed: true, ..Default::default() };
        let value = serde_json::to_value(snap).unwrap();
        assert_eq!(serde_json::from_value::<InputSnapshot>(value).unwrap(), snap);
    }
}
