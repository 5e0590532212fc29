//! Configuration for the OmniSense dispatch board.
//!
//! One TOML file merged with `OMNISENSE_*` environment variables, and the
//! translation into `omnisense_core::DashboardConfig` plus the display
//! options the TUI reads directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use omnisense_core::{
    CALL_ID_PLACEHOLDER, DashboardConfig, DisplayMode, Endpoints, PendingClosurePolicy,
    ReconnectConfig, Region, RenderOptions, TlsVerification,
};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Backend base URL.
    #[serde(default = "default_server")]
    pub server: String,

    /// REST request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate (PEM).
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub feed: FeedSection,

    #[serde(default)]
    pub endpoints: EndpointsSection,

    #[serde(default)]
    pub display: DisplaySection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: default_server(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            feed: FeedSection::default(),
            endpoints: EndpointsSection::default(),
            display: DisplaySection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FeedSection {
    #[serde(default = "default_ws_path")]
    pub ws_path: String,

    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// Give up after this many failed reconnects. Absent = never.
    #[serde(default)]
    pub max_retries: Option<u32>,

    /// Read `GET {state_path}` once before the first pushed snapshot.
    #[serde(default = "default_true")]
    pub prime_from_rest: bool,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            ws_path: default_ws_path(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            max_retries: None,
            prime_from_rest: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointsSection {
    #[serde(default = "default_state_path")]
    pub state_path: String,

    /// Must contain `{id}`.
    #[serde(default = "default_end_call_path")]
    pub end_call_path: String,

    #[serde(default = "default_health_path")]
    pub health_path: String,
}

impl Default for EndpointsSection {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
            end_call_path: default_end_call_path(),
            health_path: default_health_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplaySection {
    #[serde(default)]
    pub mode: DisplayMode,

    #[serde(default)]
    pub pending_closure: PendingClosurePolicy,

    /// Regions to lay out. Empty = all of them.
    #[serde(default)]
    pub regions: Vec<Region>,

    /// Status-bar clock tick.
    #[serde(default = "default_clock_interval_ms")]
    pub clock_interval_ms: u64,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            mode: DisplayMode::default(),
            pending_closure: PendingClosurePolicy::default(),
            regions: Vec::new(),
            clock_interval_ms: default_clock_interval_ms(),
        }
    }
}

fn default_server() -> String {
    "http://localhost:8000".into()
}
fn default_timeout() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_ws_path() -> String {
    omnisense_core::config::DEFAULT_WS_PATH.into()
}
fn default_reconnect_initial_ms() -> u64 {
    1_000
}
fn default_reconnect_max_ms() -> u64 {
    30_000
}
fn default_state_path() -> String {
    Endpoints::default().state
}
fn default_end_call_path() -> String {
    Endpoints::default().end_call
}
fn default_health_path() -> String {
    Endpoints::default().health
}
fn default_clock_interval_ms() -> u64 {
    1_000
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "omnisense", "omnisense-board").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("omnisense-board");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment. A missing file is not an
/// error; defaults and environment still apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OMNISENSE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Serialize config to TOML and write it to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Build the core runtime config. Validates URLs and paths.
    pub fn to_dashboard_config(&self) -> Result<DashboardConfig, ConfigError> {
        let server: url::Url = self.server.parse().map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", self.server),
        })?;
        if !matches!(server.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(ConfigError::Validation {
                field: "server".into(),
                reason: format!("unsupported scheme '{}'", server.scheme()),
            });
        }

        if !self.endpoints.end_call_path.contains(CALL_ID_PLACEHOLDER) {
            return Err(ConfigError::Validation {
                field: "endpoints.end_call_path".into(),
                reason: format!(
                    "must contain '{CALL_ID_PLACEHOLDER}', got '{}'",
                    self.endpoints.end_call_path
                ),
            });
        }

        if self.timeout == 0 {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }

        if self.feed.reconnect_initial_ms == 0
            || self.feed.reconnect_max_ms < self.feed.reconnect_initial_ms
        {
            return Err(ConfigError::Validation {
                field: "feed.reconnect_max_ms".into(),
                reason: format!(
                    "need 0 < reconnect_initial_ms <= reconnect_max_ms, got {} / {}",
                    self.feed.reconnect_initial_ms, self.feed.reconnect_max_ms
                ),
            });
        }

        let tls = if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        };

        let mut config = DashboardConfig::new(server);
        config.ws_path.clone_from(&self.feed.ws_path);
        config.endpoints = Endpoints {
            state: self.endpoints.state_path.clone(),
            health: self.endpoints.health_path.clone(),
            end_call: self.endpoints.end_call_path.clone(),
        };
        config.tls = tls;
        config.timeout = Duration::from_secs(self.timeout);
        config.reconnect = ReconnectConfig {
            initial_delay: Duration::from_millis(self.feed.reconnect_initial_ms),
            max_delay: Duration::from_millis(self.feed.reconnect_max_ms),
            max_retries: self.feed.max_retries,
        };
        config.prime_from_rest = self.feed.prime_from_rest;
        Ok(config)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            mode: self.display.mode,
            pending_closure: self.display.pending_closure,
        }
    }

    /// Regions to lay out, deduplicated, in layout order. An empty list
    /// means every region.
    pub fn regions(&self) -> Vec<Region> {
        if self.display.regions.is_empty() {
            return Region::all();
        }
        let mut regions = self.display.regions.clone();
        regions.sort_unstable();
        regions.dedup();
        regions
    }

    pub fn clock_interval(&self) -> Duration {
        Duration::from_millis(self.display.clock_interval_ms.max(100))
    }
}
