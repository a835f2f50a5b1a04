//! PlaybackManager: drives one sequence on the caller's terms (direction,
//! timescale, looping) and reports edge crossings.
//!
//! The manager never touches bucket membership itself. A tick that finishes
//! playback says so in its [`TickReport`]; the scheduler performs the stop.
//! The scheduler drives ticks through [`PlaybackManager::step`] so listeners
//! run at the point of each crossing.

use std::fmt;

use crate::config::Config;
use crate::error::TickError;
use crate::events::{EdgeEvent, EventKind};
use crate::looping::{LoopMode, Looping};
use crate::phase::Phase;
use crate::sequence::Sequence;

pub struct PlaybackManager {
    sequence: Box<dyn Sequence>,
    phase: Phase,
    /// Multiplier applied to every incoming delta. May be zero or negative.
    pub timescale: f32,
    pub forwards: bool,
    pub looping: Looping,
    /// Iterations completed since the last rewind.
    pub current_iteration: u32,
}

/// What a single [`PlaybackManager::tick`] did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Start/end crossings in the order they happened.
    pub events: Vec<EdgeEvent>,
    /// Final ending edge reached; the manager must stop.
    pub finished: bool,
    /// Loop boundaries crossed during this tick.
    pub crossings: u32,
    /// Overshoot (sequence time) that was not applied: past the final edge,
    /// cut off by the crossing bound, or no longer shrinking across crossings.
    pub leftover: f32,
}

impl TickReport {
    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

impl PlaybackManager {
    pub fn new(sequence: impl Sequence + 'static, phase: Phase, looping: Looping) -> Self {
        Self {
            sequence: Box::new(sequence),
            phase,
            timescale: 1.0,
            forwards: true,
            looping,
            current_iteration: 0,
        }
    }

    /// Builder-style timescale.
    pub fn with_timescale(mut self, timescale: f32) -> Self {
        self.timescale = timescale;
        self
    }

    /// Phase whose bucket runs this manager. Fixed for the manager's lifetime.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn sequence(&self) -> &dyn Sequence {
        self.sequence.as_ref()
    }

    #[inline]
    pub fn sequence_mut(&mut self) -> &mut dyn Sequence {
        self.sequence.as_mut()
    }

    #[inline]
    pub fn time_passed(&self) -> f32 {
        self.sequence.time_passed()
    }

    /// Flip direction without touching time or membership.
    pub fn reverse(&mut self) -> &mut Self {
        self.forwards = !self.forwards;
        self
    }

    /// Reset the iteration count and move to the starting edge of the current direction.
    pub fn rewind(&mut self) -> &mut Self {
        self.current_iteration = 0;
        self.rewind_time_passed();
        self
    }

    fn rewind_time_passed(&mut self) {
        let edge = if self.forwards {
            0.0
        } else {
            self.sequence.duration()
        };
        self.sequence.set_time_passed(edge);
    }

    #[inline]
    fn at_starting_edge(&self) -> bool {
        if self.forwards {
            self.sequence.is_at_zero()
        } else {
            self.sequence.is_at_duration()
        }
    }

    #[inline]
    fn at_ending_edge(&self) -> bool {
        if self.forwards {
            self.sequence.is_at_duration()
        } else {
            self.sequence.is_at_zero()
        }
    }

    /// Advance by `delta` host seconds, crossing at most
    /// [`Config::DEFAULT_MAX_LOOP_CROSSINGS`] loop boundaries.
    pub fn tick(&mut self, delta: f32) -> Result<TickReport, TickError> {
        self.tick_bounded(delta, Config::DEFAULT_MAX_LOOP_CROSSINGS)
    }

    /// Advance by `delta` host seconds.
    ///
    /// Overshoot past a loop boundary is folded into the next iteration until
    /// it is used up, playback finishes, or `max_crossings` boundaries were
    /// crossed in this call.
    pub fn tick_bounded(&mut self, delta: f32, max_crossings: u32) -> Result<TickReport, TickError> {
        let mut cursor = TickCursor::new(delta, max_crossings);
        let mut events = Vec::new();
        while let Some(edge) = self.step(&mut cursor)? {
            events.push(edge);
        }
        Ok(TickReport {
            events,
            finished: cursor.finished,
            crossings: cursor.crossings,
            leftover: cursor.leftover,
        })
    }

    /// Run the tick held by `cursor` up to its next edge crossing.
    ///
    /// `Some(Started)` is returned before that iteration's delta is applied, so
    /// whoever handles it sees the playhead on the starting edge and may move
    /// it. `Some(Ended)` means playback finished. `None` means the tick is over.
    pub fn step(&mut self, cursor: &mut TickCursor) -> Result<Option<EdgeEvent>, TickError> {
        loop {
            if cursor.done {
                return Ok(None);
            }

            let effective = match cursor.started.take() {
                Some(effective) => effective,
                None => {
                    let direction = if self.forwards { 1.0 } else { -1.0 };
                    let effective = cursor.pending * self.timescale * direction;
                    if effective == 0.0 {
                        cursor.done = true;
                        return Ok(None);
                    }
                    if !effective.is_finite() {
                        cursor.done = true;
                        return Err(TickError::InvalidDelta { delta: effective });
                    }
                    let duration = self.sequence.duration();
                    if !duration.is_finite() || duration < 0.0 {
                        cursor.done = true;
                        return Err(TickError::InvalidDuration { duration });
                    }
                    if self.at_starting_edge() {
                        cursor.started = Some(effective);
                        return Ok(Some(EdgeEvent {
                            kind: EventKind::Started,
                            forwards: self.forwards,
                        }));
                    }
                    effective
                }
            };

            let duration = self.sequence.duration();
            let previous = self.sequence.time_passed();
            self.sequence.update(effective);

            if !self.at_ending_edge() {
                cursor.done = true;
                return Ok(None);
            }

            let edge = if self.forwards { duration } else { 0.0 };
            let overshoot = (previous + effective - edge).abs();

            // A zero-length sequence completes instead of looping in place forever.
            if duration == 0.0 || !self.looping.should_loop(self.current_iteration) {
                cursor.done = true;
                cursor.finished = true;
                cursor.leftover = overshoot;
                return Ok(Some(EdgeEvent {
                    kind: EventKind::Ended,
                    forwards: self.forwards,
                }));
            }

            self.current_iteration = self.current_iteration.saturating_add(1);
            cursor.crossings += 1;
            match self.looping.mode {
                LoopMode::YoYo => {
                    self.reverse();
                }
                LoopMode::Restart => self.rewind_time_passed(),
            }
            log::debug!(
                "loop boundary crossed: iteration={} forwards={} overshoot={}",
                self.current_iteration,
                self.forwards,
                overshoot
            );

            // Overshoot is sequence time; convert back so timescale applies once.
            let next = if self.timescale == 0.0 {
                0.0
            } else {
                overshoot / self.timescale.abs()
            };
            if cursor.crossings >= cursor.max_crossings && next > 0.0 {
                log::warn!(
                    "loop crossing bound ({}) hit, discarding {} of overshoot",
                    cursor.max_crossings,
                    overshoot
                );
                cursor.done = true;
                cursor.leftover = overshoot;
                return Ok(None);
            }
            // The first crossing may start outside the sequence; after that the
            // overshoot must shrink or f32 has absorbed the duration.
            if cursor.crossings > 1 && next >= cursor.pending.abs() {
                log::warn!(
                    "overshoot {} no longer shrinks across loop boundaries, discarding it",
                    overshoot
                );
                cursor.done = true;
                cursor.leftover = overshoot;
                return Ok(None);
            }
            cursor.pending = next;
        }
    }
}

/// State of one tick driven through [`PlaybackManager::step`].
#[derive(Clone, Debug)]
pub struct TickCursor {
    pending: f32,
    max_crossings: u32,
    /// Effective delta of an iteration whose start edge was just reported.
    started: Option<f32>,
    done: bool,
    finished: bool,
    crossings: u32,
    leftover: f32,
}

impl TickCursor {
    pub fn new(delta: f32, max_crossings: u32) -> Self {
        Self {
            pending: delta,
            max_crossings,
            started: None,
            done: false,
            finished: false,
            crossings: 0,
            leftover: 0.0,
        }
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    #[inline]
    pub fn crossings(&self) -> u32 {
        self.crossings
    }

    #[inline]
    pub fn leftover(&self) -> f32 {
        self.leftover
    }
}

impl fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("phase", &self.phase)
            .field("timescale", &self.timescale)
            .field("forwards", &self.forwards)
            .field("looping", &self.looping)
            .field("current_iteration", &self.current_iteration)
            .field("time_passed", &self.sequence.time_passed())
            .field("duration", &self.sequence.duration())
            .finish()
    }
}
