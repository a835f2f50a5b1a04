//! PhaseBucket: the set of managers advanced by one phase.
//!
//! Membership may change at any time, including from inside a pass (a
//! listener stopping itself, or starting another manager). While a pass is
//! running, mutations are parked in `pending_add` / `pending_remove` and applied
//! by [`PhaseBucket::finish_pass`]. Every manager present when the pass began
//! is visited exactly once; managers added during the pass wait for the next one.

use hashbrown::HashSet;

use crate::ids::ManagerId;

#[derive(Debug, Default)]
pub struct PhaseBucket {
    current: HashSet<ManagerId>,
    pending_add: HashSet<ManagerId>,
    pending_remove: HashSet<ManagerId>,
    iterating: bool,
}

impl PhaseBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request membership. Idempotent.
    pub fn add(&mut self, id: ManagerId) {
        if self.iterating {
            // Stopped and restarted within one pass: drop the pending removal.
            if !self.pending_remove.remove(&id) && !self.current.contains(&id) {
                self.pending_add.insert(id);
            }
        } else {
            self.current.insert(id);
        }
    }

    /// Request removal. Idempotent.
    pub fn remove(&mut self, id: ManagerId) {
        if self.iterating {
            if !self.pending_add.remove(&id) && self.current.contains(&id) {
                self.pending_remove.insert(id);
            }
        } else {
            self.current.remove(&id);
        }
    }

    /// Membership as it will be once pending requests are applied.
    pub fn contains(&self, id: ManagerId) -> bool {
        if self.iterating {
            self.pending_add.contains(&id)
                || (self.current.contains(&id) && !self.pending_remove.contains(&id))
        } else {
            self.current.contains(&id)
        }
    }

    /// Managers that will be visited by the next pass.
    pub fn len(&self) -> usize {
        self.current.len() + self.pending_add.len() - self.pending_remove.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_iterating(&self) -> bool {
        self.iterating
    }

    /// Start a pass and return the managers to visit, or `None` if a pass is
    /// already running. The snapshot is sorted so passes are reproducible.
    pub fn begin_pass(&mut self) -> Option<Vec<ManagerId>> {
        if self.iterating {
            return None;
        }
        self.iterating = true;
        let mut visiting: Vec<ManagerId> = self.current.iter().copied().collect();
        visiting.sort_unstable();
        Some(visiting)
    }

    /// End the pass: apply removals, then additions.
    pub fn finish_pass(&mut self) {
        self.iterating = false;

        if !self.pending_remove.is_empty() {
            for id in self.pending_remove.drain() {
                self.current.remove(&id);
            }
        }

        if !self.pending_add.is_empty() {
            self.current.extend(self.pending_add.drain());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = ManagerId> + '_ {
        self.current.iter().copied()
    }
}
