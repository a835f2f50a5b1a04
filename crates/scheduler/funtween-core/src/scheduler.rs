//! Scheduler: owns managers, one bucket per phase, and per-manager listeners.
//!
//! Methods:
//! - new, spawn, despawn, manager (chaining handle), register/unregister
//! - on_start/on_end listeners, delivered in-line during the pass
//! - dispatch (one phase), update / late_update / fixed_update (host frame groupings)
//!
//! There is no global instance. Hosts create one and pass it around by `&mut`.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::panic::{self, AssertUnwindSafe};

use hashbrown::HashMap;

use crate::bucket::PhaseBucket;
use crate::config::Config;
use crate::error::SchedulerError;
use crate::events::{EventKind, Outputs, PlaybackEvent};
use crate::ids::{IdAllocator, ManagerId};
use crate::looping::Looping;
use crate::manager::{PlaybackManager, TickCursor};
use crate::phase::{FrameDeltas, Phase};

/// Callback invoked synchronously when a manager crosses an edge. It may start,
/// stop or despawn any manager, including the one that emitted the event.
pub type Listener = Box<dyn FnMut(&PlaybackEvent, &mut Scheduler)>;

#[derive(Default)]
struct Listeners {
    on_start: Vec<Listener>,
    on_end: Vec<Listener>,
}

impl Listeners {
    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<Listener> {
        match kind {
            EventKind::Started => &mut self.on_start,
            EventKind::Ended => &mut self.on_end,
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("on_start", &self.on_start.len())
            .field("on_end", &self.on_end.len())
            .finish()
    }
}

/// Listeners of one slot, lent out for the duration of a delivery.
struct CheckedOut<'a> {
    scheduler: &'a mut Scheduler,
    manager: ManagerId,
    kind: EventKind,
    taken: Vec<Listener>,
}

impl Drop for CheckedOut<'_> {
    fn drop(&mut self) {
        if !self.scheduler.managers.contains_key(&self.manager) {
            return;
        }
        let slot = self
            .scheduler
            .listeners
            .entry(self.manager)
            .or_default()
            .slot_mut(self.kind);
        // Listeners registered during the call go after the existing ones.
        let added = std::mem::replace(slot, std::mem::take(&mut self.taken));
        slot.extend(added);
    }
}

#[derive(Debug, Default)]
struct PhaseBuckets([PhaseBucket; 5]);

impl PhaseBuckets {
    fn any_iterating(&self) -> bool {
        self.0.iter().any(PhaseBucket::is_iterating)
    }
}

impl Index<Phase> for PhaseBuckets {
    type Output = PhaseBucket;

    fn index(&self, phase: Phase) -> &PhaseBucket {
        &self.0[phase.index()]
    }
}

impl IndexMut<Phase> for PhaseBuckets {
    fn index_mut(&mut self, phase: Phase) -> &mut PhaseBucket {
        &mut self.0[phase.index()]
    }
}

#[derive(Debug)]
pub struct Scheduler {
    cfg: Config,
    ids: IdAllocator,
    managers: HashMap<ManagerId, PlaybackManager>,
    buckets: PhaseBuckets,
    listeners: HashMap<ManagerId, Listeners>,

    // Per-dispatch outputs
    outputs: Outputs,
}

impl Scheduler {
    /// Create a new scheduler with the given config.
    pub fn new(cfg: Config) -> Self {
        Self {
            outputs: Outputs::with_capacity(cfg.max_events_per_tick.min(64)),
            cfg,
            ids: IdAllocator::new(),
            managers: HashMap::new(),
            buckets: PhaseBuckets::default(),
            listeners: HashMap::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Take ownership of a manager. It is not playing until resumed.
    pub fn spawn(&mut self, manager: PlaybackManager) -> ManagerId {
        let id = self.ids.alloc_manager();
        log::debug!("spawned {:?} on {}", id, manager.phase().name());
        self.managers.insert(id, manager);
        id
    }

    /// Stop a manager, drop its listeners and hand it back.
    pub fn despawn(&mut self, id: ManagerId) -> Option<PlaybackManager> {
        let manager = self.managers.remove(&id)?;
        self.buckets[manager.phase()].remove(id);
        self.listeners.remove(&id);
        log::debug!("despawned {:?}", id);
        Some(manager)
    }

    #[inline]
    pub fn get(&self, id: ManagerId) -> Option<&PlaybackManager> {
        self.managers.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ManagerId) -> Option<&mut PlaybackManager> {
        self.managers.get_mut(&id)
    }

    /// Chaining handle for playback control of one manager.
    pub fn manager(&mut self, id: ManagerId) -> Option<ManagerMut<'_>> {
        let phase = self.managers.get(&id)?.phase();
        Some(ManagerMut {
            scheduler: self,
            id,
            phase,
        })
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn bucket(&self, phase: Phase) -> &PhaseBucket {
        &self.buckets[phase]
    }

    /// Whether the manager is (or is about to be) a member of its phase bucket.
    pub fn is_playing(&self, id: ManagerId) -> bool {
        self.managers
            .get(&id)
            .is_some_and(|m| self.buckets[m.phase()].contains(id))
    }

    /// Number of managers the next pass of `phase` will visit.
    pub fn playing(&self, phase: Phase) -> usize {
        self.buckets[phase].len()
    }

    /// Add the manager to the bucket of its phase.
    pub fn register(&mut self, id: ManagerId) -> Result<(), SchedulerError> {
        let phase = self.phase_of(id)?;
        self.set_membership(id, phase, true);
        Ok(())
    }

    /// Remove the manager from the bucket of its phase.
    pub fn unregister(&mut self, id: ManagerId) -> Result<(), SchedulerError> {
        let phase = self.phase_of(id)?;
        self.set_membership(id, phase, false);
        Ok(())
    }

    pub fn on_start(
        &mut self,
        id: ManagerId,
        listener: impl FnMut(&PlaybackEvent, &mut Scheduler) + 'static,
    ) -> Result<(), SchedulerError> {
        self.listen(id, EventKind::Started, Box::new(listener))
    }

    pub fn on_end(
        &mut self,
        id: ManagerId,
        listener: impl FnMut(&PlaybackEvent, &mut Scheduler) + 'static,
    ) -> Result<(), SchedulerError> {
        self.listen(id, EventKind::Ended, Box::new(listener))
    }

    fn listen(
        &mut self,
        id: ManagerId,
        kind: EventKind,
        listener: Listener,
    ) -> Result<(), SchedulerError> {
        if !self.managers.contains_key(&id) {
            return Err(SchedulerError::ManagerNotFound { id });
        }
        self.listeners
            .entry(id)
            .or_default()
            .slot_mut(kind)
            .push(listener);
        Ok(())
    }

    /// Events recorded since the last top-level dispatch began.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    /// Advance every manager in `phase` by `delta`. The host calls this once per
    /// phase per frame; a zero delta is a valid no-op tick.
    pub fn dispatch(&mut self, phase: Phase, delta: f32) -> Result<&Outputs, SchedulerError> {
        self.begin_frame();
        self.run_phase(phase, delta)?;
        Ok(&self.outputs)
    }

    /// Regular update: scaled phase, then unscaled.
    pub fn update(&mut self, frame: &FrameDeltas) -> Result<&Outputs, SchedulerError> {
        self.run_frame(&[Phase::Update, Phase::UpdateUnscaled], frame)
    }

    /// Late update: scaled phase, then unscaled.
    pub fn late_update(&mut self, frame: &FrameDeltas) -> Result<&Outputs, SchedulerError> {
        self.run_frame(&[Phase::LateUpdate, Phase::LateUpdateUnscaled], frame)
    }

    pub fn fixed_update(&mut self, frame: &FrameDeltas) -> Result<&Outputs, SchedulerError> {
        self.run_frame(&[Phase::FixedUpdate], frame)
    }

    fn run_frame(
        &mut self,
        phases: &[Phase],
        frame: &FrameDeltas,
    ) -> Result<&Outputs, SchedulerError> {
        self.begin_frame();
        for &phase in phases {
            self.run_phase(phase, phase.delta(frame))?;
        }
        Ok(&self.outputs)
    }

    fn begin_frame(&mut self) {
        // A listener dispatching another phase appends to the outer log.
        if !self.buckets.any_iterating() {
            self.outputs.clear();
        }
    }

    fn run_phase(&mut self, phase: Phase, delta: f32) -> Result<(), SchedulerError> {
        let Some(visiting) = self.buckets[phase].begin_pass() else {
            return Err(SchedulerError::NestedDispatch { phase });
        };
        log::trace!(
            "{} pass: {} managers, delta={}",
            phase.name(),
            visiting.len(),
            delta
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            visiting
                .into_iter()
                .try_for_each(|id| self.tick_one(id, delta))
        }));

        // Pending membership is applied whether the pass completed, failed or unwound.
        self.buckets[phase].finish_pass();

        match outcome {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }

    fn tick_one(&mut self, id: ManagerId, delta: f32) -> Result<(), SchedulerError> {
        let mut cursor = TickCursor::new(delta, self.cfg.max_loop_crossings);
        loop {
            // Despawned earlier in this pass, or by its own listener mid-tick.
            let Some(manager) = self.managers.get_mut(&id) else {
                return Ok(());
            };
            let phase = manager.phase();
            let edge = manager
                .step(&mut cursor)
                .map_err(|source| SchedulerError::Tick {
                    manager: id,
                    source,
                })?;
            let Some(edge) = edge else {
                return Ok(());
            };

            // Stop before delivering so an end listener may play it again.
            if edge.kind == EventKind::Ended {
                self.set_membership(id, phase, false);
            }
            self.deliver(edge.attach(id));
        }
    }

    fn deliver(&mut self, event: PlaybackEvent) {
        if self.cfg.record_events {
            if self.outputs.events.len() < self.cfg.max_events_per_tick {
                self.outputs.push_event(event);
            } else {
                log::debug!("event log full, not recording {:?}", event);
            }
        }

        let Some(listeners) = self.listeners.get_mut(&event.manager) else {
            return;
        };
        let taken = std::mem::take(listeners.slot_mut(event.kind));
        if taken.is_empty() {
            return;
        }
        // Taken out so listeners can borrow the scheduler mutably; the guard
        // puts them back even if one of them panics.
        let mut checkout = CheckedOut {
            scheduler: self,
            manager: event.manager,
            kind: event.kind,
            taken,
        };
        for listener in checkout.taken.iter_mut() {
            listener(&event, checkout.scheduler);
        }
    }

    fn phase_of(&self, id: ManagerId) -> Result<Phase, SchedulerError> {
        self.managers
            .get(&id)
            .map(PlaybackManager::phase)
            .ok_or(SchedulerError::ManagerNotFound { id })
    }

    fn set_membership(&mut self, id: ManagerId, phase: Phase, playing: bool) {
        let bucket = &mut self.buckets[phase];
        if playing {
            bucket.add(id);
        } else {
            bucket.remove(id);
        }
        log::debug!(
            "{} {:?} on {}",
            if playing { "resume" } else { "stop" },
            id,
            phase.name()
        );
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

/// Playback control for one manager; every call returns `&mut Self` for chaining.
pub struct ManagerMut<'a> {
    scheduler: &'a mut Scheduler,
    id: ManagerId,
    phase: Phase,
}

impl ManagerMut<'_> {
    #[inline]
    pub fn id(&self) -> ManagerId {
        self.id
    }

    pub fn get(&self) -> Option<&PlaybackManager> {
        self.scheduler.managers.get(&self.id)
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.buckets[self.phase].contains(self.id)
    }

    fn with(&mut self, f: impl FnOnce(&mut PlaybackManager)) {
        if let Some(manager) = self.scheduler.managers.get_mut(&self.id) {
            f(manager);
        }
    }

    /// Play from the starting edge of the given direction.
    pub fn play(&mut self, forwards: bool) -> &mut Self {
        self.resume_towards(forwards);
        self.rewind()
    }

    /// Play forwards from an arbitrary offset. The offset is not clamped.
    pub fn play_from(&mut self, start_time: f32) -> &mut Self {
        self.rewind();
        self.resume_towards(true);
        self.with(|m| m.sequence_mut().set_time_passed(start_time));
        self
    }

    /// Resume from the current position in the given direction.
    pub fn resume_towards(&mut self, forwards: bool) -> &mut Self {
        self.with(|m| m.forwards = forwards);
        self.resume()
    }

    /// Resume from the current position.
    pub fn resume(&mut self) -> &mut Self {
        self.scheduler.set_membership(self.id, self.phase, true);
        self
    }

    pub fn stop(&mut self) -> &mut Self {
        self.scheduler.set_membership(self.id, self.phase, false);
        self
    }

    pub fn reverse(&mut self) -> &mut Self {
        self.with(|m| {
            m.reverse();
        });
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.with(|m| {
            m.rewind();
        });
        self
    }

    pub fn set_timescale(&mut self, timescale: f32) -> &mut Self {
        self.with(|m| m.timescale = timescale);
        self
    }

    pub fn set_looping(&mut self, looping: Looping) -> &mut Self {
        self.with(|m| m.looping = looping);
        self
    }
}
