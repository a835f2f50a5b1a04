//! Core configuration for funtween-core.

use serde::{Deserialize, Serialize};

/// Configuration for scheduler limits and event recording.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upper bound on loop boundaries a single manager may cross in one tick.
    /// Overshoot still pending when the bound is hit is discarded.
    pub max_loop_crossings: u32,

    /// Maximum events retained in the per-dispatch log. Listeners still see
    /// every event; only the returned [`Outputs`](crate::Outputs) is capped.
    pub max_events_per_tick: usize,

    /// Record start/end events into [`Outputs`](crate::Outputs).
    pub record_events: bool,
}

impl Config {
    /// Crossing bound used when none is configured, including by
    /// [`PlaybackManager::tick`](crate::PlaybackManager::tick).
    pub const DEFAULT_MAX_LOOP_CROSSINGS: u32 = 10_000;
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_loop_crossings: Self::DEFAULT_MAX_LOOP_CROSSINGS,
            max_events_per_tick: 1024,
            record_events: true,
        }
    }
}
