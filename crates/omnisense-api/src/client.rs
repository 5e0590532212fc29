// Dispatch backend HTTP client
//
// Wraps `reqwest::Client` with endpoint-template URL construction and
// status/body handling for the handful of REST calls the dashboard makes:
// the state priming read, the health probe, and the fire-and-forget
// "end call" action.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Placeholder substituted with the call id in endpoint templates.
pub const CALL_ID_PLACEHOLDER: &str = "{id}";

/// REST endpoint paths, relative to the backend base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Full current state, same shape as a feed snapshot.
    pub state: String,
    /// Liveness probe.
    pub health: String,
    /// End a call. Must contain `{id}`.
    pub end_call: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            state: "/api/state".into(),
            health: "/health".into(),
            end_call: "/api/calls/{id}".into(),
        }
    }
}

/// Backend health report from the health endpoint.
///
/// Only `status` is guaranteed; the counters are informational.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub active_calls: Option<u64>,
    #[serde(default)]
    pub operators: Option<u64>,
    #[serde(default)]
    pub queue_size: Option<u64>,
    #[serde(default)]
    pub dashboard_connections: Option<u64>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Raw HTTP client for the dispatch backend.
///
/// Stateless apart from the connection pool: every method is a single
/// request/response exchange and nothing is retried here.
pub struct DispatchClient {
    http: reqwest::Client,
    base_url: Url,
    endpoints: Endpoints,
    timeout_secs: u64,
}

impl DispatchClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(
        base_url: Url,
        endpoints: Endpoints,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            endpoints,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, endpoints: Endpoints) -> Self {
        Self {
            http,
            base_url,
            endpoints,
            timeout_secs: 0,
        }
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve an endpoint template against the base URL.
    ///
    /// Each `/`-separated segment is appended to the base path; a segment
    /// equal to `{id}` is replaced by `call_id` (percent-encoded).
    pub fn endpoint_url(&self, template: &str, call_id: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase)
            })?;
            segments.pop_if_empty();
            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match (segment, call_id) {
                    (CALL_ID_PLACEHOLDER, Some(id)) => {
                        segments.push(id);
                    }
                    _ => {
                        segments.push(segment);
                    }
                }
            }
        }
        Ok(url)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the current full state as raw JSON.
    ///
    /// The value is handed to the normalizer untouched; no typed
    /// deserialization happens at this layer.
    pub async fn fetch_state(&self) -> Result<serde_json::Value, Error> {
        let url = self.endpoint_url(&self.endpoints.state, None)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;
        let body = self.read_success(resp).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Probe backend liveness.
    pub async fn health(&self) -> Result<HealthReport, Error> {
        let url = self.endpoint_url(&self.endpoints.health, None)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;
        let body = self.read_success(resp).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// End a call by id. Returns the response body, which callers only log.
    pub async fn end_call(&self, call_id: &str) -> Result<String, Error> {
        let url = self.endpoint_url(&self.endpoints.end_call, Some(call_id))?;
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| self.map_send(e))?;

        self.read_success(resp).await
    }

    // ── Response helpers ─────────────────────────────────────────────

    async fn read_success(&self, resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send(e))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn map_send(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> DispatchClient {
        DispatchClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Endpoints::default(),
        )
    }

    #[test]
    fn end_call_url_substitutes_id() {
        let c = client("http://localhost:8000");
        let url = c.endpoint_url("/api/calls/{id}", Some("c1")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/calls/c1");
    }

    #[test]
    fn endpoint_url_keeps_base_prefix() {
        let c = client("https://dispatch.example.org/omnisense/");
        let url = c.endpoint_url("/api/state", None).unwrap();
        assert_eq!(url.as_str(), "https://dispatch.example.org/omnisense/api/state");
    }

    #[test]
    fn call_id_is_percent_encoded() {
        let c = client("http://localhost:8000");
        let url = c.endpoint_url("/api/calls/{id}/end", Some("a b/c")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/calls/a%20b%2Fc/end");
    }

    #[test]
    fn health_report_tolerates_missing_counters() {
        let report: HealthReport = serde_json::from_str(r#"{"status":"healthy"}"#).unwrap();
        assert!(report.is_healthy());
        assert_eq!(report.active_calls, None);
    }
}
