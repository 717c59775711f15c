//! MCP over HTTP.
//!
//! One POST route carries JSON-RPC messages to [`mcp::handle_message`];
//! `GET /health` is an unauthenticated liveness probe that never touches
//! a device. When `auth.require_auth` is set the MCP route demands
//! `Authorization: Bearer <token>` matching one of `auth.api_tokens`.

use std::io;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use fortimcp_config::AuthConfig;

use crate::mcp;
use crate::tools::{SERVER_VERSION, ToolContext};

type Tokens = Arc<[String]>;

/// Build the application router.
pub fn router(ctx: Arc<ToolContext>, auth: &AuthConfig) -> Router {
    let mut rpc = Router::new().route(&ctx.server.path, post(handle_rpc));
    if auth.require_auth {
        let tokens: Tokens = auth
            .api_tokens
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        rpc = rpc.route_layer(middleware::from_fn_with_state(tokens, require_token));
    }

    Router::new()
        .route("/health", get(health))
        .merge(rpc)
        .layer(cors(&auth.allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

fn cors(origins: &[String]) -> CorsLayer {
    let allow = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind the listener for `host:port`.
pub async fn bind(host: &str, port: u16) -> io::Result<TcpListener> {
    TcpListener::bind((host, port)).await
}

/// Serve until SIGINT/SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "MCP HTTP transport listening");
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT"),
                    _ = sigterm.recv() => info!("received SIGTERM"),
                }
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT");
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

async fn handle_rpc(State(ctx): State<Arc<ToolContext>>, body: Bytes) -> Response {
    let request: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "unparseable MCP request body");
            return (StatusCode::BAD_REQUEST, Json(mcp::parse_error(&e))).into_response();
        }
    };

    match mcp::handle_message(&request, &ctx).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health(State(ctx): State<Arc<ToolContext>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "server": ctx.server.name,
        "version": SERVER_VERSION,
        "registered_devices": ctx.registry.len(),
    }))
}

// ── Auth ─────────────────────────────────────────────────────────────

/// 401 without a bearer header, 403 when the token matches none configured.
async fn require_token(State(tokens): State<Tokens>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(provided) = provided else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Missing or invalid Authorization header" })),
        )
            .into_response();
    };

    // Compare against every token so timing does not reveal which one matched.
    let valid = tokens.iter().fold(false, |matched, token| {
        matched | constant_time_eq(token.as_bytes(), provided.as_bytes())
    });
    if !valid {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "Invalid API token" })),
        )
            .into_response();
    }

    next.run(request).await
}

/// Byte comparison whose running time depends only on `expected`'s length.
pub fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    let mut diff = u8::from(expected.len() != provided.len());
    for (i, byte) in expected.iter().enumerate() {
        diff |= byte ^ provided.get(i).copied().unwrap_or(0xff);
    }
    diff == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fortimcp_config::ServerConfig;
    use fortimcp_core::DeviceRegistry;
    use pretty_assertions::assert_eq;

    use super::*;

    async fn spawn(auth: AuthConfig) -> String {
        let ctx = Arc::new(ToolContext::new(
            Arc::new(DeviceRegistry::new()),
            ServerConfig::default(),
        ));
        let app = router(ctx, &auth);
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await });
        format!("http://{addr}")
    }

    fn secured() -> AuthConfig {
        AuthConfig {
            require_auth: true,
            api_tokens: vec!["s3cret".into()],
            ..AuthConfig::default()
        }
    }

    fn ping() -> Value {
        json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" })
    }

    #[test]
    fn constant_time_eq_cases() {
        assert!(constant_time_eq(b"token", b"token"));
        assert!(!constant_time_eq(b"token", b"tokem"));
        assert!(!constant_time_eq(b"token", b"token-longer"));
        assert!(!constant_time_eq(b"token", b""));
    }

    #[tokio::test]
    async fn rpc_round_trip() {
        let base = spawn(AuthConfig::default()).await;
        let response: Value = reqwest::Client::new()
            .post(format!("{base}/fortigate-mcp"))
            .json(&ping())
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(response, json!({ "jsonrpc": "2.0", "id": 1, "result": {} }));
    }

    #[tokio::test]
    async fn notifications_are_accepted_without_body() {
        let base = spawn(AuthConfig::default()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/fortigate-mcp"))
            .json(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 202);
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error() {
        let base = spawn(AuthConfig::default()).await;
        let response = reqwest::Client::new()
            .post(format!("{base}/fortigate-mcp"))
            .body("{not json")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], -32700);
    }

    #[tokio::test]
    async fn auth_rejects_missing_and_wrong_tokens() {
        let base = spawn(secured()).await;
        let client = reqwest::Client::new();
        let url = format!("{base}/fortigate-mcp");

        let missing = client.post(&url).json(&ping()).send().await.unwrap();
        assert_eq!(missing.status(), 401);

        let wrong = client
            .post(&url)
            .bearer_auth("nope")
            .json(&ping())
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 403);

        let ok = client
            .post(&url)
            .bearer_auth("s3cret")
            .json(&ping())
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
    }

    #[tokio::test]
    async fn health_is_public() {
        let base = spawn(secured()).await;
        let body: Value = reqwest::get(format!("{base}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["status"], "ok");
        assert_eq!(body["registered_devices"], 0);
    }
}
