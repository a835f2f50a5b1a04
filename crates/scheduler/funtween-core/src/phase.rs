//! Phases of the host tick cycle.
//!
//! Each phase owns one [`PhaseBucket`](crate::PhaseBucket) inside the
//! scheduler and receives its own delta-time stream from the host.

use serde::{Deserialize, Serialize};

/// A named point in the host frame at which managers are advanced.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Regular update, driven by scaled time.
    #[default]
    Update,
    /// Regular update, driven by unscaled (real) time.
    UpdateUnscaled,
    /// Late update, driven by scaled time.
    LateUpdate,
    /// Late update, driven by unscaled time.
    LateUpdateUnscaled,
    /// Fixed-step (physics) update.
    FixedUpdate,
}

impl Phase {
    /// Every phase, in the order a host frame visits them.
    pub const ALL: [Phase; 5] = [
        Phase::FixedUpdate,
        Phase::Update,
        Phase::UpdateUnscaled,
        Phase::LateUpdate,
        Phase::LateUpdateUnscaled,
    ];

    /// Dense index used to address per-phase storage.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::Update => 0,
            Self::UpdateUnscaled => 1,
            Self::LateUpdate => 2,
            Self::LateUpdateUnscaled => 3,
            Self::FixedUpdate => 4,
        }
    }

    /// Get the name of this phase
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::UpdateUnscaled => "update_unscaled",
            Self::LateUpdate => "late_update",
            Self::LateUpdateUnscaled => "late_update_unscaled",
            Self::FixedUpdate => "fixed_update",
        }
    }

    /// Pick the delta this phase consumes out of a host frame.
    #[inline]
    pub fn delta(self, frame: &FrameDeltas) -> f32 {
        match self {
            Self::Update | Self::LateUpdate => frame.scaled,
            Self::UpdateUnscaled | Self::LateUpdateUnscaled => frame.unscaled,
            Self::FixedUpdate => frame.fixed,
        }
    }
}

/// The three delta streams a host supplies each frame.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameDeltas {
    /// Delta of game time (affected by the host's global time scale / pause).
    pub scaled: f32,
    /// Real elapsed time, ignoring global time scale.
    pub unscaled: f32,
    /// Fixed physics step.
    pub fixed: f32,
}

impl FrameDeltas {
    /// Frame where scaled and unscaled time advanced by the same amount.
    pub fn uniform(delta: f32, fixed: f32) -> Self {
        Self {
            scaled: delta,
            unscaled: delta,
            fixed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense_and_unique() {
        let mut seen = [false; 5];
        for phase in Phase::ALL {
            assert!(!seen[phase.index()], "{} indexed twice", phase.name());
            seen[phase.index()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn phases_pick_their_stream() {
        let frame = FrameDeltas {
            scaled: 0.5,
            unscaled: 1.0,
            fixed: 0.02,
        };
        assert_eq!(Phase::Update.delta(&frame), 0.5);
        assert_eq!(Phase::LateUpdate.delta(&frame), 0.5);
        assert_eq!(Phase::UpdateUnscaled.delta(&frame), 1.0);
        assert_eq!(Phase::LateUpdateUnscaled.delta(&frame), 1.0);
        assert_eq!(Phase::FixedUpdate.delta(&frame), 0.02);
    }
}
