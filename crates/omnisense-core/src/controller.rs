// ── Dashboard application state ──
//
// Explicit owner of everything with a lifetime: the REST client, the
// snapshot feed, the store, and the background task that connects them.
// Created with `new`, wired up by `start`, torn down by `shutdown`.

use std::sync::Arc;

use omnisense_api::{DispatchClient, FeedEvent, HealthReport, SnapshotFeed};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::{CallId, DashboardState};
use crate::normalize::normalize;
use crate::store::SnapshotStore;
use crate::stream::SnapshotStream;

const DISPATCH_CHANNEL_SIZE: usize = 32;

// ── ConnectionState ──────────────────────────────────────────────

/// Feed connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

// ── DispatchOutcome ──────────────────────────────────────────────

/// Result of one fire-and-forget `end_call`, for status display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub call_id: CallId,
    /// `Err` carries the failure message.
    pub result: Result<(), String>,
}

// ── Dashboard ────────────────────────────────────────────────────

/// The application-state holder.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
#[derive(Clone)]
pub struct Dashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    client: Arc<DispatchClient>,
    store: Arc<SnapshotStore>,
    connection_state: watch::Sender<ConnectionState>,
    dispatch_tx: broadcast::Sender<DispatchOutcome>,
    cancel: CancellationToken,
    feed: Mutex<Option<SnapshotFeed>>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Dashboard {
    /// Create a dashboard from configuration. Does NOT connect;
    /// call [`start()`](Self::start) to open the feed.
    pub fn new(config: DashboardConfig) -> Result<Self, CoreError> {
        let client = DispatchClient::new(
            config.rest_url()?,
            config.endpoints.clone(),
            &config.transport(),
        )?;
        Ok(Self::with_client(config, client))
    }

    /// Create a dashboard around a pre-built client.
    pub fn with_client(config: DashboardConfig, client: DispatchClient) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (dispatch_tx, _) = broadcast::channel(DISPATCH_CHANNEL_SIZE);

        Self {
            inner: Arc::new(DashboardInner {
                config,
                client: Arc::new(client),
                store: Arc::new(SnapshotStore::new()),
                connection_state,
                dispatch_tx,
                cancel: CancellationToken::new(),
                feed: Mutex::new(None),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Open the snapshot feed and start applying snapshots.
    ///
    /// With `prime_from_rest`, the current state is fetched over REST
    /// first so the board is populated before the first push. A failed
    /// priming read is logged and otherwise ignored. Calling `start` on a
    /// running dashboard does nothing.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut feed_slot = self.inner.feed.lock().await;
        if feed_slot.is_some() {
            debug!("dashboard already started");
            return Ok(());
        }
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::NotRunning);
        }

        let ws_url = self.inner.config.ws_url()?;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        if self.inner.config.prime_from_rest {
            if let Err(e) = self.refresh_from_rest().await {
                warn!(error = %e, "priming from REST state failed, waiting for feed");
            }
        }

        let feed = SnapshotFeed::connect(
            ws_url,
            self.inner.config.reconnect.clone(),
            self.inner.cancel.child_token(),
        );
        let rx = feed.subscribe();
        *feed_slot = Some(feed);

        let handle = tokio::spawn(feed_consumer_task(
            rx,
            Arc::clone(&self.inner.store),
            self.inner.connection_state.clone(),
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(handle);

        info!(server = %self.inner.config.server, "dashboard started");
        Ok(())
    }

    /// Cancel the feed and background tasks and wait for them to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(feed) = self.inner.feed.lock().await.take() {
            feed.shutdown().await;
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("dashboard shut down");
    }

    // ── Data ─────────────────────────────────────────────────────

    /// Fetch the full state over REST and apply it like a pushed snapshot.
    pub async fn refresh_from_rest(&self) -> Result<Arc<DashboardState>, CoreError> {
        let raw = self.inner.client.fetch_state().await?;
        self.inner.store.replace(normalize(&raw));
        debug!(snapshots = self.inner.store.snapshot_count(), "applied REST state");
        Ok(self.inner.store.current())
    }

    /// Probe backend liveness.
    pub async fn health(&self) -> Result<HealthReport, CoreError> {
        Ok(self.inner.client.health().await?)
    }

    // ── Actions ──────────────────────────────────────────────────

    /// End a call. Fire-and-forget.
    ///
    /// Spawns a single request and returns at once. Nothing local changes;
    /// the effect shows up in a later snapshot. The outcome is logged and
    /// published on [`dispatch_events`](Self::dispatch_events), never
    /// retried. The returned handle may be dropped.
    pub fn end_call(&self, call_id: CallId) -> JoinHandle<()> {
        let client = Arc::clone(&self.inner.client);
        let tx = self.inner.dispatch_tx.clone();

        tokio::spawn(async move {
            let result = match client.end_call(call_id.as_str()).await {
                Ok(body) => {
                    debug!(call_id = %call_id, response = %body, "end call accepted");
                    Ok(())
                }
                Err(e) => {
                    warn!(call_id = %call_id, error = %e, "end call failed");
                    Err(e.to_string())
                }
            };
            let _ = tx.send(DispatchOutcome { call_id, result });
        })
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    pub fn snapshots(&self) -> SnapshotStream {
        self.inner.store.subscribe()
    }

    pub fn current(&self) -> Arc<DashboardState> {
        self.inner.store.current()
    }

    pub fn dispatch_events(&self) -> broadcast::Receiver<DispatchOutcome> {
        self.inner.dispatch_tx.subscribe()
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Apply every feed snapshot to the store and mirror the feed's
/// connection status.
async fn feed_consumer_task(
    mut rx: broadcast::Receiver<FeedEvent>,
    store: Arc<SnapshotStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = rx.recv() => event,
        };

        match event {
            Ok(FeedEvent::Snapshot(raw)) => {
                store.replace(normalize(&raw));
                // A snapshot proves the link is up even if the feed's
                // `Connected` was lagged past.
                if *connection_state.borrow() != ConnectionState::Connected {
                    attempt = 0;
                    connection_state.send_replace(ConnectionState::Connected);
                }
            }
            Ok(FeedEvent::Connected) => {
                attempt = 0;
                connection_state.send_replace(ConnectionState::Connected);
            }
            Ok(FeedEvent::Disconnected(reason)) => {
                attempt = attempt.saturating_add(1);
                debug!(%reason, attempt, "feed disconnected");
                connection_state.send_replace(ConnectionState::Reconnecting { attempt });
            }
            Ok(FeedEvent::GaveUp) => {
                connection_state.send_replace(ConnectionState::Failed);
                break;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // Snapshots are full replacements; the next one catches up.
                debug!(skipped, "feed consumer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    debug!("feed consumer exiting");
}
