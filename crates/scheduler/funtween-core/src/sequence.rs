//! The sequence contract consumed by the scheduler.
//!
//! A sequence is anything with a duration and a settable playhead that can be
//! advanced by a signed delta. How it maps time to animated values is its own
//! business; the scheduler only needs the edges.

use serde::{Deserialize, Serialize};

use crate::looping::Looping;
use crate::manager::PlaybackManager;
use crate::phase::Phase;

pub trait Sequence {
    /// Total length in seconds. Must be finite and non-negative.
    fn duration(&self) -> f32;

    fn time_passed(&self) -> f32;

    /// Seek directly. Callers may place the playhead outside `[0, duration]`.
    fn set_time_passed(&mut self, time: f32);

    /// Advance by a signed delta (negative when playing backwards).
    fn update(&mut self, delta: f32);

    /// Edge checks are exact comparisons so replays stay bit-for-bit deterministic.
    fn is_at_zero(&self) -> bool {
        self.time_passed() == 0.0
    }

    fn is_at_duration(&self) -> bool {
        self.time_passed() == self.duration()
    }
}

impl<S: Sequence + ?Sized> Sequence for Box<S> {
    fn duration(&self) -> f32 {
        (**self).duration()
    }

    fn time_passed(&self) -> f32 {
        (**self).time_passed()
    }

    fn set_time_passed(&mut self, time: f32) {
        (**self).set_time_passed(time)
    }

    fn update(&mut self, delta: f32) {
        (**self).update(delta)
    }

    fn is_at_zero(&self) -> bool {
        (**self).is_at_zero()
    }

    fn is_at_duration(&self) -> bool {
        (**self).is_at_duration()
    }
}

/// Plain clamped playhead over `[0, duration]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    duration: f32,
    time_passed: f32,
}

impl Timeline {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            time_passed: 0.0,
        }
    }
}

impl Sequence for Timeline {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn time_passed(&self) -> f32 {
        self.time_passed
    }

    fn set_time_passed(&mut self, time: f32) {
        self.time_passed = time;
    }

    fn update(&mut self, delta: f32) {
        // max/min instead of clamp: a bad duration must not panic here
        self.time_passed = (self.time_passed + delta).min(self.duration).max(0.0);
    }
}

/// Wrap a sequence into a [`PlaybackManager`].
pub trait SequenceExt: Sequence + Sized + 'static {
    /// Single play on the given phase.
    fn managed(self, phase: Phase) -> PlaybackManager {
        PlaybackManager::new(self, phase, Looping::single())
    }

    fn managed_with(self, looping: Looping, phase: Phase) -> PlaybackManager {
        PlaybackManager::new(self, phase, looping)
    }
}

impl<S: Sequence + 'static> SequenceExt for S {}
