//! Identifiers and a simple allocator for scheduled managers.

use serde::{Deserialize, Serialize};

/// Opaque identity of a [`PlaybackManager`](crate::PlaybackManager) owned by a
/// [`Scheduler`](crate::Scheduler). Buckets store these, never the managers.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManagerId(pub u32);

/// Monotonic allocator for ManagerId.
/// Ids are never reused within one scheduler, so a stale id cannot alias a newer manager.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_manager: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_manager(&mut self) -> ManagerId {
        let id = ManagerId(self.next_manager);
        self.next_manager = self.next_manager.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
