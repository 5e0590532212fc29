// ── Snapshot store ──
//
// Single-writer holder of the current normalized snapshot with
// push-based change notification.

mod snapshot_store;

pub use snapshot_store::SnapshotStore;
