//! Data bridge: connects [`Dashboard`] streams to TUI actions.
//!
//! Runs as a background task: starts the dashboard, then forwards every
//! snapshot, connection-state transition, and dispatch outcome as an
//! [`Action`] through the TUI's action channel.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use omnisense_core::Dashboard;

use crate::action::{Action, Notification};

/// Drive `dashboard` until `cancel` fires, then shut it down.
pub async fn spawn_data_bridge(
    dashboard: Dashboard,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut snapshots = dashboard.snapshots();
    let mut conn_state = dashboard.connection_state();
    let mut outcomes = dashboard.dispatch_events();

    if let Err(e) = dashboard.start().await {
        warn!(error = %e, "failed to start dashboard");
        let _ = action_tx.send(Action::Notify(Notification::error(format!(
            "Cannot start feed: {e}"
        ))));
        return;
    }

    // Priming may already have filled the store.
    let _ = action_tx.send(Action::SnapshotApplied(snapshots.latest()));
    let _ = action_tx.send(Action::ConnectionChanged(
        conn_state.borrow_and_update().clone(),
    ));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Some(state) = snapshots.changed() => {
                let _ = action_tx.send(Action::SnapshotApplied(state));
            }
            Ok(()) = conn_state.changed() => {
                let state = conn_state.borrow_and_update().clone();
                let _ = action_tx.send(Action::ConnectionChanged(state));
            }
            outcome = outcomes.recv() => match outcome {
                Ok(outcome) => {
                    let _ = action_tx.send(Action::DispatchFinished(outcome));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "dispatch outcomes lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    dashboard.shutdown().await;
    debug!("data bridge shut down");
}
