//! MCP JSON-RPC 2.0 message handling.
//!
//! Transport-agnostic: [`handle_message`] maps one decoded request to one
//! response (or `None` for notifications). [`run_stdio`] drives it over
//! newline-delimited stdin/stdout; the HTTP transport lives in
//! [`crate::http`].
//!
//! | Method       | Result                                   |
//! |--------------|------------------------------------------|
//! | `initialize` | protocol version, capabilities, identity |
//! | `tools/list` | every tool with its input schema         |
//! | `tools/call` | `{content, isError?}`                    |
//! | `ping`       | `{}`                                     |

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::tools::{self, SERVER_VERSION, ToolContext};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Handle one decoded JSON-RPC message.
///
/// Messages without an `id` are notifications and never get a response.
pub async fn handle_message(request: &Value, ctx: &ToolContext) -> Option<Value> {
    let method = request.get("method").and_then(Value::as_str).unwrap_or("");
    let Some(id) = request.get("id").cloned() else {
        debug!(method, "notification");
        return None;
    };

    let outcome = match method {
        "initialize" => Ok(initialize(ctx)),
        "tools/list" => Ok(json!({ "tools": tools::definitions() })),
        "tools/call" => tools_call(request, ctx).await,
        "ping" => Ok(json!({})),
        other => Err((METHOD_NOT_FOUND, format!("Method not found: {other}"))),
    };

    Some(match outcome {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => error_response(id, code, &message),
    })
}

/// Response for a body that is not valid JSON.
pub fn parse_error(err: &serde_json::Error) -> Value {
    error_response(Value::Null, PARSE_ERROR, &format!("Parse error: {err}"))
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}

fn initialize(ctx: &ToolContext) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": ctx.server.name,
            "version": SERVER_VERSION
        }
    })
}

async fn tools_call(request: &Value, ctx: &ToolContext) -> Result<Value, (i64, String)> {
    let params = request.get("params");
    let name = params
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| (INVALID_PARAMS, "Invalid params: missing tool name".to_owned()))?;
    let empty = json!({});
    let args = params
        .and_then(|p| p.get("arguments"))
        .filter(|a| !a.is_null())
        .unwrap_or(&empty);

    let result = tools::handle_tool_call(name, args, ctx).await;
    let mut body = json!({ "content": result.content });
    if result.is_error {
        body["isError"] = json!(true);
    }
    Ok(body)
}

// ── stdio transport ──────────────────────────────────────────────────

/// Serve MCP over stdin/stdout until EOF.
pub async fn run_stdio(ctx: Arc<ToolContext>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Value>(line) {
            Ok(request) => handle_message(&request, &ctx).await,
            Err(e) => {
                warn!(error = %e, "unparseable message on stdin");
                Some(parse_error(&e))
            }
        };

        if let Some(response) = response {
            write_response(&mut stdout, &response).await?;
        }
    }

    debug!("stdin closed, stopping");
    Ok(())
}

/// One line per message, flushed immediately.
async fn write_response<W: AsyncWrite + Unpin>(out: &mut W, response: &Value) -> std::io::Result<()> {
    let mut line = serde_json::to_string(response).unwrap_or_default();
    line.push('\n');
    out.write_all(line.as_bytes()).await?;
    out.flush().await
}
