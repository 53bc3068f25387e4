use serde::{Serialize, Deserialize};

use crate::core::types::{EntityStore, Snapshot};

pub const HISTORY_LIMIT: usize = 20;

/// Bounded undo stack of store snapshots, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    snapshots: Vec<Snapshot>,
    #[serde(skip, default = "default_limit")]
    max_entries: usize,
}

fn default_limit() -> usize {
    HISTORY_LIMIT
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(HISTORY_LIMIT)
    }

    pub fn with_limit(max_entries: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            max_entries: max_entries.max(1),
        }
    }

    /// Rebuild from persisted snapshots, keeping only the most recent ones.
    pub fn from_snapshots(mut snapshots: Vec<Snapshot>, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        if snapshots.len() > max_entries {
            let start_idx = snapshots.len() - max_entries;
            snapshots.drain(..start_idx);
        }

        Self { snapshots, max_entries }
    }

    pub fn record(&mut self, store: &EntityStore) {
        self.push(Snapshot::capture(store));
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);

        // Maintain size limit
        if self.snapshots.len() > self.max_entries {
            self.snapshots.remove(0);
        }
    }

    pub fn pop(&mut self) -> Option<Snapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.max_entries
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }
}
