//! Change tracking for derived topology.

use serde::{Deserialize, Serialize};

/// Drop derived relation tables without touching the topology.
///
/// Stale tables are already rebuilt on demand; this only releases their
/// memory early.
pub trait InvalidateCache {
    fn invalidate_cache(&mut self);
}

/// Monotonic counter bumped on every structural mutation.
///
/// Derived tables remember the value they were built against; a mismatch
/// means the table is stale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChangeCounter(u64);

impl ChangeCounter {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn bump(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Shift this counter past `previous`, keeping its own progress.
    #[inline]
    pub fn advance_past(&mut self, previous: u64) {
        self.0 = self.0.wrapping_add(previous).wrapping_add(1);
    }
}
