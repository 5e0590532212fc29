//! Dashboard snapshot feed with auto-reconnect.
//!
//! Connects to the backend's dashboard WebSocket and streams every full
//! state snapshot through a [`tokio::sync::broadcast`] channel. One text
//! frame is one complete `DashboardState`; there is no framing or schema
//! negotiation beyond that. Handles reconnection with exponential backoff
//! + jitter automatically.
//!
//! # Example
//!
//! ```rust,ignore
//! use omnisense_api::websocket::{FeedEvent, ReconnectConfig, SnapshotFeed};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://localhost:8000/ws/dashboard")?;
//!
//! let feed = SnapshotFeed::connect(ws_url, ReconnectConfig::default(), cancel.clone());
//! let mut rx = feed.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let FeedEvent::Snapshot(state) = event {
//!         println!("{} active calls", state["active_calls"].as_array().map_or(0, Vec::len));
//!     }
//! }
//!
//! feed.shutdown().await;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── Broadcast channel capacity ───────────────────────────────────────

/// Snapshots are full replacements, so a lagging subscriber only needs the
/// newest one. A small buffer is enough.
const FEED_CHANNEL_CAPACITY: usize = 64;

// ── FeedEvent ────────────────────────────────────────────────────────

/// Everything the feed reports to its subscribers.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The WebSocket upgrade succeeded.
    Connected,
    /// A well-formed snapshot frame (JSON object root).
    Snapshot(Arc<serde_json::Value>),
    /// The connection dropped; a reconnect attempt follows unless the
    /// retry budget is exhausted or the feed was cancelled.
    Disconnected(String),
    /// The retry budget is exhausted. No further events follow.
    GaveUp,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── SnapshotFeed ─────────────────────────────────────────────────────

/// Handle to a running snapshot feed.
///
/// Owns exactly one logical inbound channel. Call
/// [`shutdown`](Self::shutdown) to cancel the background task and wait
/// for it to finish.
pub struct SnapshotFeed {
    event_tx: broadcast::Sender<FeedEvent>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SnapshotFeed {
    /// Spawn the connect/read/reconnect loop for `ws_url`.
    ///
    /// Returns immediately. The first connection attempt happens
    /// asynchronously, so subscribe right away to see the first
    /// [`FeedEvent::Connected`].
    pub fn connect(ws_url: Url, reconnect: ReconnectConfig, cancel: CancellationToken) -> Self {
        let (event_tx, _) = broadcast::channel(FEED_CHANNEL_CAPACITY);

        let task_tx = event_tx.clone();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            ws_loop(ws_url, task_tx, reconnect, task_cancel).await;
        });

        Self {
            event_tx,
            cancel,
            task,
        }
    }

    /// Get a new broadcast receiver for the feed.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`]; skipping is safe because
    /// the next snapshot replaces everything anyway.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.event_tx.subscribe()
    }

    /// Whether the background task has exited (cancelled or gave up).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancel the background task and wait for it to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "snapshot feed task did not exit cleanly");
        }
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn ws_loop(
    ws_url: Url,
    event_tx: broadcast::Sender<FeedEvent>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &event_tx, &cancel) => result,
        };

        if cancel.is_cancelled() {
            break;
        }

        match result {
            // Clean disconnect (server close frame or stream ended).
            // Reset attempt counter and reconnect after the base delay.
            Ok(()) => {
                tracing::info!("dashboard feed disconnected cleanly, reconnecting");
                let _ = event_tx.send(FeedEvent::Disconnected("connection closed".into()));
                attempt = 0;
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "dashboard feed error");
                let _ = event_tx.send(FeedEvent::Disconnected(e.to_string()));

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "dashboard feed reconnection limit reached, giving up"
                        );
                        let _ = event_tx.send(FeedEvent::GaveUp);
                        break;
                    }
                }
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("dashboard feed loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection, read frames until it drops.
async fn connect_and_read(
    url: &Url,
    event_tx: &broadcast::Sender<FeedEvent>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to dashboard feed");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri);

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("dashboard feed connected");
    let _ = event_tx.send(FeedEvent::Connected);

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        if let Some(snapshot) = parse_frame(&text) {
                            // No subscribers right now is not an error
                            let _ = event_tx.send(FeedEvent::Snapshot(Arc::new(snapshot)));
                        }
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("dashboard feed ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "dashboard feed close frame received"
                            );
                        } else {
                            tracing::info!("dashboard feed close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("dashboard feed stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- the backend only sends text
                    }
                }
            }
        }
    }
}

// ── Frame parsing ────────────────────────────────────────────────────

/// Parse one text frame into a snapshot value.
///
/// Anything that is not a JSON object is rejected here so a garbage frame
/// can never blank the operator's view: the caller keeps showing the last
/// good snapshot.
fn parse_frame(text: &str) -> Option<serde_json::Value> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.is_object() => Some(value),
        Ok(other) => {
            tracing::warn!(
                kind = json_kind(&other),
                "discarding dashboard frame with non-object root"
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                len = text.len(),
                "discarding malformed dashboard frame"
            );
            None
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from many consoles.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
