// ── Core error types ──
//
// User-facing errors from omnisense-core. Consumers never see reqwest
// errors or raw HTTP bodies directly; the `From<omnisense_api::Error>`
// impl translates transport failures into dashboard-level variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach dispatch backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Dispatch backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Dashboard is not running")]
    NotRunning,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("Backend error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<omnisense_api::Error> for CoreError {
    fn from(err: omnisense_api::Error) -> Self {
        match err {
            omnisense_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            omnisense_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            omnisense_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            omnisense_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            omnisense_api::Error::Http { status, body } => CoreError::Api {
                message: body,
                status: Some(status),
            },
            omnisense_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            omnisense_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
