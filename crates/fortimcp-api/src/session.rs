// FortiGate device session
//
// Wraps one `reqwest::Client` per appliance with the REST v2 URL layout,
// VDOM injection, and the success/failure classification every caller
// relies on. Exactly one attempt per call: no retries, no backoff.

use std::time::Instant;

use reqwest::StatusCode;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::auth::AuthMode;
use crate::config::DeviceConfig;
use crate::error::Error;

/// HTTP verbs the FortiGate REST API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
            HttpMethod::Delete => Self::DELETE,
        }
    }
}

/// Authenticated request channel to a single FortiGate appliance.
///
/// Created when a device is registered and dropped when it is removed.
/// Sessions are shared by reference (`Arc`) and never duplicated, so the
/// connection pool inside the `reqwest::Client` belongs to exactly one
/// device.
pub struct DeviceSession {
    id: String,
    config: DeviceConfig,
    base_url: String,
    http: reqwest::Client,
}

impl std::fmt::Debug for DeviceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("id", &self.id)
            .field("base_url", &self.base_url)
            .field("vdom", &self.config.vdom)
            .field("auth", &self.config.auth_mode())
            .finish_non_exhaustive()
    }
}

impl DeviceSession {
    /// Build a session against `https://{host}:{port}/api/v2`.
    pub fn new(id: impl Into<String>, config: DeviceConfig) -> Result<Self, Error> {
        let base_url = config.base_url();
        Self::with_base_url(id, config, base_url)
    }

    /// Build a session against an explicit API root.
    ///
    /// The root must already include the `/api/v2` prefix. Used to point a
    /// session at a test server or a reverse proxy.
    pub fn with_base_url(
        id: impl Into<String>,
        config: DeviceConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        let id = id.into();
        let http = config
            .transport()
            .build_client()
            .map_err(|e| Error::InvalidConfig {
                device_id: id.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        let base_url = base_url.into().trim_end_matches('/').to_owned();

        Ok(Self {
            id,
            config,
            base_url,
            http,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.config.auth_mode()
    }

    /// The VDOM used when a call does not override it.
    pub fn default_vdom(&self) -> &str {
        &self.config.vdom
    }

    // ── Request pipeline ─────────────────────────────────────────────

    /// Execute one request and classify the result.
    ///
    /// `endpoint` is relative to the API root (`cmdb/firewall/policy`) and
    /// never carries the VDOM: it is merged into the query from `vdom` or
    /// the session default, replacing any `vdom` key in `query`.
    ///
    /// A status below 400 yields the decoded JSON body, or
    /// `{"status": "success"}` when the body is empty or not JSON.
    pub async fn execute(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        vdom: Option<&str>,
    ) -> Result<Value, Error> {
        let endpoint = endpoint.trim_start_matches('/');
        let url = format!("{}/{endpoint}", self.base_url);
        let vdom = vdom.unwrap_or(&self.config.vdom);

        let mut params: Vec<(&str, &str)> = query
            .iter()
            .copied()
            .filter(|(key, _)| *key != "vdom")
            .collect();
        params.push(("vdom", vdom));

        let mut request = self.http.request(method.into(), &url).query(&params);
        request = self.config.credentials.apply(request);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(device = %self.id, %method, %url, vdom, "sending request");

        let started = Instant::now();
        let outcome = Self::send(request).await;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok((status, text)) => {
                if status.is_client_error() || status.is_server_error() {
                    warn!(
                        device = %self.id,
                        %method,
                        path = endpoint,
                        status = status.as_u16(),
                        elapsed_ms,
                        "API call failed"
                    );
                    return Err(Error::Api {
                        device_id: self.id.clone(),
                        status: status.as_u16(),
                        message: failure_message(status, &text),
                    });
                }
                debug!(
                    device = %self.id,
                    %method,
                    path = endpoint,
                    status = status.as_u16(),
                    elapsed_ms,
                    "API call"
                );
                Ok(parse_success(&text))
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    format!(
                        "request timed out after {}s",
                        self.config.timeout.as_secs()
                    )
                } else {
                    error_chain(&e)
                };
                warn!(
                    device = %self.id,
                    %method,
                    path = endpoint,
                    elapsed_ms,
                    error = %message,
                    "API call failed"
                );
                Err(Error::Network {
                    device_id: self.id.clone(),
                    message,
                })
            }
        }
    }

    /// Send the request and read the full body under the client timeout.
    async fn send(request: reqwest::RequestBuilder) -> Result<(StatusCode, String), reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        Ok((status, text))
    }

    pub async fn get(&self, endpoint: &str, vdom: Option<&str>) -> Result<Value, Error> {
        self.execute(HttpMethod::Get, endpoint, &[], None, vdom).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        body: &Value,
        vdom: Option<&str>,
    ) -> Result<Value, Error> {
        self.execute(HttpMethod::Post, endpoint, &[], Some(body), vdom)
            .await
    }

    pub async fn put(&self, endpoint: &str, body: &Value, vdom: Option<&str>) -> Result<Value, Error> {
        self.execute(HttpMethod::Put, endpoint, &[], Some(body), vdom)
            .await
    }

    pub async fn delete(&self, endpoint: &str, vdom: Option<&str>) -> Result<Value, Error> {
        self.execute(HttpMethod::Delete, endpoint, &[], None, vdom)
            .await
    }

    // ── Monitor endpoints ────────────────────────────────────────────

    /// `GET monitor/system/status`
    pub async fn system_status(&self) -> Result<Value, Error> {
        self.get("monitor/system/status", None).await
    }

    /// `GET cmdb/system/vdom`
    pub async fn vdoms(&self) -> Result<Value, Error> {
        self.get("cmdb/system/vdom", None).await
    }

    /// `GET monitor/system/interface?interface={name}`
    pub async fn interface_status(&self, name: &str, vdom: Option<&str>) -> Result<Value, Error> {
        self.execute(
            HttpMethod::Get,
            "monitor/system/interface",
            &[("interface", name)],
            None,
            vdom,
        )
        .await
    }

    /// `GET monitor/router/ipv4`
    pub async fn routing_table(&self, vdom: Option<&str>) -> Result<Value, Error> {
        self.get("monitor/router/ipv4", vdom).await
    }

    /// Probe the system status endpoint. Never fails: errors are logged
    /// and reported as `false`.
    pub async fn test_connection(&self) -> bool {
        match self.system_status().await {
            Ok(_) => true,
            Err(e) => {
                warn!(device = %self.id, error = %e, "connection test failed");
                false
            }
        }
    }
}

// ── Response classification ──────────────────────────────────────────

/// `API request failed: {status}` plus the appliance's `error` field when
/// the body is JSON carrying one, or the raw body when it is not JSON.
fn failure_message(status: StatusCode, body: &str) -> String {
    let mut message = format!("API request failed: {}", status.as_u16());

    let detail = match serde_json::from_str::<Value>(body) {
        Ok(parsed) => parsed.get("error").map(|e| match e {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        Err(_) => {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
    };

    if let Some(detail) = detail {
        message.push_str(" - ");
        message.push_str(&detail);
    }
    message
}

fn parse_success(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| json!({ "status": "success" }))
}

/// Flatten a reqwest error and its sources into one line.
fn error_chain(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
