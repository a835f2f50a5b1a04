//! Notifications emitted while stepping.
//!
//! A manager reports [`EdgeEvent`]s from its tick; the scheduler tags them with
//! the manager's id, hands them to listeners and records them in [`Outputs`].

use serde::{Deserialize, Serialize};

use crate::ids::ManagerId;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The sequence left its starting edge.
    Started,
    /// The sequence reached its final ending edge and playback stopped.
    Ended,
}

/// Edge crossing as seen by the manager itself, before it is attributed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct EdgeEvent {
    pub kind: EventKind,
    /// Direction active at the moment of the crossing.
    pub forwards: bool,
}

impl EdgeEvent {
    #[inline]
    pub fn attach(self, manager: ManagerId) -> PlaybackEvent {
        PlaybackEvent {
            manager,
            kind: self.kind,
            forwards: self.forwards,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlaybackEvent {
    pub manager: ManagerId,
    pub kind: EventKind,
    pub forwards: bool,
}

/// Outputs returned by [`Scheduler::dispatch`](crate::Scheduler::dispatch) and friends.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<PlaybackEvent>,
}

impl Outputs {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: PlaybackEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events emitted by one manager, in emission order.
    pub fn for_manager(&self, manager: ManagerId) -> impl Iterator<Item = &PlaybackEvent> + '_ {
        self.events.iter().filter(move |e| e.manager == manager)
    }

    pub fn count(&self, manager: ManagerId, kind: EventKind) -> usize {
        self.for_manager(manager).filter(|e| e.kind == kind).count()
    }
}
