//! Looping policy for a playback manager.

use serde::{Deserialize, Serialize};

/// What happens to a sequence when it reaches its ending edge and may loop.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum LoopMode {
    /// Jump back to the starting edge and keep the direction.
    #[default]
    Restart,
    /// Keep the position and flip the direction.
    YoYo,
}

/// How many times to play and how to cross each loop boundary.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Looping {
    /// Number of iterations to play; [`Looping::FOREVER`] means unbounded.
    pub times: u32,
    pub mode: LoopMode,
}

impl Looping {
    pub const FOREVER: u32 = 0;
    pub const SINGLE: u32 = 1;

    pub const fn new(times: u32, mode: LoopMode) -> Self {
        Self { times, mode }
    }

    /// Play once, no looping.
    pub const fn single() -> Self {
        Self::new(Self::SINGLE, LoopMode::Restart)
    }

    pub const fn forever(mode: LoopMode) -> Self {
        Self::new(Self::FOREVER, mode)
    }

    pub const fn forever_yoyo() -> Self {
        Self::forever(LoopMode::YoYo)
    }

    pub const fn times(times: u32, mode: LoopMode) -> Self {
        Self::new(times, mode)
    }

    #[inline]
    pub fn is_forever(&self) -> bool {
        self.times == Self::FOREVER
    }

    /// Whether reaching the ending edge during `current_iteration` starts another iteration.
    #[inline]
    pub fn should_loop(&self, current_iteration: u32) -> bool {
        self.is_forever() || current_iteration < self.times.saturating_sub(1)
    }
}

impl Default for Looping {
    fn default() -> Self {
        Self::single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_never_loops() {
        assert!(!Looping::single().should_loop(0));
    }

    #[test]
    fn forever_always_loops() {
        let looping = Looping::forever(LoopMode::Restart);
        assert!(looping.should_loop(0));
        assert!(looping.should_loop(u32::MAX));
    }

    #[test]
    fn finite_loops_until_last_iteration() {
        let looping = Looping::times(3, LoopMode::YoYo);
        assert!(looping.should_loop(0));
        assert!(looping.should_loop(1));
        assert!(!looping.should_loop(2));
    }

    #[test]
    fn unknown_mode_is_rejected_on_deserialize() {
        let err = serde_json::from_str::<Looping>(r#"{"times":2,"mode":"Bounce"}"#);
        assert!(err.is_err());
        let ok: Looping = serde_json::from_str(r#"{"times":2,"mode":"YoYo"}"#).unwrap();
        assert_eq!(ok, Looping::times(2, LoopMode::YoYo));
    }
}
