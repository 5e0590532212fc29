// ── Current snapshot holder ──
//
// Exactly one writer (the feed consumer) replaces the snapshot wholesale;
// any number of readers observe it through `watch` channels. There is no
// merging: every `replace` discards the previous state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::warn;

use crate::model::{CallId, CallStatus, DashboardState};
use crate::stream::SnapshotStream;

pub struct SnapshotStore {
    state: watch::Sender<Arc<DashboardState>>,
    last_snapshot: watch::Sender<Option<DateTime<Utc>>>,
    snapshot_count: watch::Sender<u64>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(DashboardState::default()));
        let (last_snapshot, _) = watch::channel(None);
        let (snapshot_count, _) = watch::channel(0);
        Self {
            state,
            last_snapshot,
            snapshot_count,
        }
    }

    /// Replace the current snapshot.
    ///
    /// Status regressions against the previous snapshot are logged and
    /// otherwise accepted: the backend is authoritative. Returns the
    /// number of regressions seen.
    pub fn replace(&self, next: DashboardState) -> usize {
        let regressions = {
            let prev = self.state.borrow();
            status_regressions(&prev, &next)
        };
        for (id, from, to) in &regressions {
            warn!(call_id = %id, %from, %to, "call status moved backwards");
        }

        self.state.send_replace(Arc::new(next));
        self.last_snapshot.send_replace(Some(Utc::now()));
        self.snapshot_count.send_modify(|n| *n += 1);
        regressions.len()
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn current(&self) -> Arc<DashboardState> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        SnapshotStream::new(self.state.subscribe())
    }

    /// When the last snapshot arrived, or `None` before the first one.
    pub fn last_snapshot_at(&self) -> Option<DateTime<Utc>> {
        *self.last_snapshot.borrow()
    }

    /// Snapshots applied since creation.
    pub fn snapshot_count(&self) -> u64 {
        *self.snapshot_count.borrow()
    }

    /// How long ago the last snapshot arrived.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_snapshot_at().map(|t| Utc::now() - t)
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

fn status_regressions(
    prev: &DashboardState,
    next: &DashboardState,
) -> Vec<(CallId, CallStatus, CallStatus)> {
    let before: HashMap<&CallId, CallStatus> =
        prev.calls().into_iter().map(|c| (&c.id, c.status)).collect();

    next.calls()
        .into_iter()
        .filter_map(|call| {
            let old = *before.get(&call.id)?;
            (old.stage() > call.status.stage()).then(|| (call.id.clone(), old, call.status))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::normalize::normalize;

    #[test]
    fn replace_swaps_whole_snapshot() {
        let store = SnapshotStore::new();
        assert!(store.current().is_empty());
        assert_eq!(store.last_snapshot_at(), None);

        store.replace(normalize(&json!({ "active_calls": [{ "id": "a" }, { "id": "b" }] })));
        store.replace(normalize(&json!({ "active_calls": [{ "id": "c" }] })));

        let ids: Vec<String> = store
            .current()
            .calls()
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["c"]);
        assert_eq!(store.snapshot_count(), 2);
        assert!(store.last_snapshot_at().is_some());
    }

    #[test]
    fn regression_is_reported_but_applied() {
        let store = SnapshotStore::new();
        store.replace(normalize(&json!({
            "completed_calls": [{ "id": "a", "status": "COMPLETED" }]
        })));
        let regressions = store.replace(normalize(&json!({
            "active_calls": [{ "id": "a", "status": "ACTIVE" }]
        })));
        assert_eq!(regressions, 1);
        assert_eq!(store.current().active_calls[0].status, CallStatus::Active);
    }

    #[test]
    fn forward_transitions_are_not_regressions() {
        let store = SnapshotStore::new();
        store.replace(normalize(&json!({ "queue": [{ "id": "a", "status": "QUEUED" }] })));
        let regressions = store.replace(normalize(&json!({
            "active_calls": [{ "id": "a", "status": "IN_PROGRESS" }]
        })));
        assert_eq!(regressions, 0);
    }

    #[tokio::test]
    async fn subscribers_see_each_replacement() {
        let store = SnapshotStore::new();
        let mut stream = store.subscribe();
        assert!(stream.current().is_empty());

        store.replace(normalize(&json!({ "patterns": ["cluster"] })));
        let snap = stream.changed().await.unwrap();
        assert_eq!(snap.patterns, vec!["cluster".to_owned()]);
        assert_eq!(stream.current().patterns.len(), 1);
    }
}
