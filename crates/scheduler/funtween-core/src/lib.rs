//! funtween core (engine-agnostic)
//!
//! Advances tween sequences once per host tick, grouped into phase buckets.
//! A [`PlaybackManager`] owns direction, timescale and looping for one
//! [`Sequence`]; a [`PhaseBucket`] holds the managers playing in one phase and
//! tolerates membership changes made while it is being iterated; the
//! [`Scheduler`] owns both and is what the host calls each frame.

pub mod bucket;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod looping;
pub mod manager;
pub mod phase;
pub mod scheduler;
pub mod sequence;

// Re-exports for consumers (host adapters)
pub use bucket::PhaseBucket;
pub use config::Config;
pub use error::{SchedulerError, TickError};
pub use events::{EdgeEvent, EventKind, Outputs, PlaybackEvent};
pub use ids::{IdAllocator, ManagerId};
pub use looping::{LoopMode, Looping};
pub use manager::{PlaybackManager, TickCursor, TickReport};
pub use phase::{FrameDeltas, Phase};
pub use scheduler::{Listener, ManagerMut, Scheduler};
pub use sequence::{Sequence, SequenceExt, Timeline};
