// ── Runtime connection configuration ──
//
// These types describe *how* to reach the dispatch backend and how the
// feed should behave. They never touch disk: the TUI (through
// omnisense-config) constructs a `DashboardConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use omnisense_api::{Endpoints, ReconnectConfig, TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;

/// Default dashboard WebSocket path on the backend.
pub const DEFAULT_WS_PATH: &str = "/ws/dashboard";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed lab deployments).
    DangerAcceptInvalid,
}

/// Configuration for one dispatch backend.
///
/// Built by the TUI, passed to `Dashboard`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Backend base URL (e.g., `http://localhost:8000`).
    pub server: Url,
    /// Path of the dashboard WebSocket, relative to `server`.
    pub ws_path: String,
    /// REST endpoint paths.
    pub endpoints: Endpoints,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout for REST calls.
    pub timeout: Duration,
    /// Feed reconnect backoff.
    pub reconnect: ReconnectConfig,
    /// Fetch `GET /api/state` once before the first pushed snapshot.
    pub prime_from_rest: bool,
}

impl DashboardConfig {
    pub fn new(server: Url) -> Self {
        Self {
            server,
            ws_path: DEFAULT_WS_PATH.into(),
            endpoints: Endpoints::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            prime_from_rest: true,
        }
    }

    /// WebSocket URL of the snapshot feed.
    ///
    /// `http` becomes `ws` and `https` becomes `wss`; a server already
    /// given as `ws(s)://` keeps its scheme. `ws_path` is appended to any
    /// base path the server URL carries.
    pub fn ws_url(&self) -> Result<Url, CoreError> {
        let mut url = self.server.clone();
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(CoreError::Config {
                    message: format!("unsupported server scheme: {other}"),
                });
            }
        };
        url.set_scheme(scheme).map_err(|()| CoreError::Config {
            message: format!("cannot derive websocket URL from {}", self.server),
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|()| CoreError::Config {
                message: format!("server URL cannot be a base: {}", self.server),
            })?;
            segments.pop_if_empty();
            segments.extend(self.ws_path.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    /// Base URL for REST requests.
    ///
    /// The inverse of [`ws_url`](Self::ws_url): a server given as
    /// `ws(s)://` is reached over `http(s)://`.
    pub fn rest_url(&self) -> Result<Url, CoreError> {
        let mut url = self.server.clone();
        let scheme = match url.scheme() {
            "http" | "ws" => "http",
            "https" | "wss" => "https",
            other => {
                return Err(CoreError::Config {
                    message: format!("unsupported server scheme: {other}"),
                });
            }
        };
        url.set_scheme(scheme).map_err(|()| CoreError::Config {
            message: format!("cannot derive REST URL from {}", self.server),
        })?;
        Ok(url)
    }

    /// Transport settings for the REST client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
