// ── Dashboard snapshot ──

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::call::{CallId, CallSnapshot};

/// Backend-computed counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_active: u64,
    pub queued: u64,
    pub completed: u64,
}

/// One complete, normalized snapshot. Replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    pub stats: Stats,
    pub queue: Vec<CallSnapshot>,
    pub active_calls: Vec<CallSnapshot>,
    pub completed_calls: Vec<CallSnapshot>,
    /// Mass-event advisories, in backend order.
    pub patterns: Vec<String>,
}

impl DashboardState {
    /// Every call in the snapshot, `active_calls`, then `queue`, then
    /// `completed_calls`. A call listed more than once appears at its
    /// first position only.
    pub fn calls(&self) -> Vec<&CallSnapshot> {
        let mut seen: HashSet<&CallId> = HashSet::new();
        self.active_calls
            .iter()
            .chain(&self.queue)
            .chain(&self.completed_calls)
            .filter(|call| seen.insert(&call.id))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty() && self.active_calls.is_empty() && self.completed_calls.is_empty()
    }
}
