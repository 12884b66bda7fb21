//! Request dispatch: JSON-RPC method routing over a [`ToolRegistry`].

use std::sync::Arc;

use serde_json::{json, Value as J};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::core::content::CallToolResult;
use crate::core::error::{ChannelError, ToolError};
use crate::core::mcp::{
    err as rpc_err, from_tool_error, ok as rpc_ok, protocol_err, CallToolParams, InitializeResult,
    RpcReq, RpcResp, ServerInfo, INTERNAL_ERROR, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::infra::logging::log_metric;
use crate::infra::runtime::channel::{Frame, LineChannel};
use crate::tools::registry::ToolRegistry;

/// Server context: the frozen registry plus what `initialize` reports.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    info: ServerInfo,
    protocol_version: String,
}

impl McpServer {
    pub fn new(
        registry: ToolRegistry,
        info: ServerInfo,
        protocol_version: impl Into<String>,
    ) -> Self {
        Self { registry: Arc::new(registry), info, protocol_version: protocol_version.into() }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Serve requests one at a time until the input side closes. Per-request
    /// failures become error responses; only channel failures end the loop.
    pub async fn serve<R, W>(&self, channel: &mut LineChannel<R, W>) -> Result<(), ChannelError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(frame) = channel.recv().await? {
            let resp = match frame {
                Frame::Line(line) if line.trim().is_empty() => continue,
                Frame::Line(line) => self.handle_line(&line).await,
                Frame::Oversized(len) => {
                    let limit = channel.max_frame_bytes();
                    tracing::warn!(len, limit, "oversized frame dropped");
                    Some(parse_error(format!(
                        "frame of {len} bytes exceeds limit of {limit} bytes"
                    )))
                }
            };
            if let Some(resp) = resp {
                channel.send(&resp).await?;
            }
        }
        tracing::info!("input channel closed; shutting down");
        Ok(())
    }

    /// Handle one frame. Returns `None` for notifications, including
    /// malformed ones.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResp> {
        let raw: J = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "unparseable frame");
                return Some(parse_error(format!("parse error: {e}")));
            }
        };
        let is_object = raw.is_object();
        let id_hint = raw.get("id").filter(|id| !id.is_null()).cloned();
        let req: RpcReq = match serde_json::from_value(raw) {
            Ok(r) => r,
            Err(e) => {
                if is_object && id_hint.is_none() {
                    tracing::debug!(error = %e, "malformed notification ignored");
                    return None;
                }
                return Some(protocol_err(
                    id_hint.unwrap_or(J::Null),
                    INVALID_REQUEST,
                    "InvalidRequest",
                    format!("invalid request: {e}"),
                ));
            }
        };
        self.handle(req).await
    }

    pub async fn handle(&self, req: RpcReq) -> Option<RpcResp> {
        tracing::debug!(method = %req.method, id = ?req.id, "request received");
        let Some(id) = req.id.clone() else {
            tracing::debug!(method = %req.method, "notification ignored");
            return None;
        };
        if req.jsonrpc != "2.0" {
            return Some(protocol_err(
                id,
                INVALID_REQUEST,
                "InvalidRequest",
                format!("unsupported jsonrpc version: {}", req.jsonrpc),
            ));
        }
        let resp = match req.method.as_str() {
            "initialize" => self.initialize(id),
            "ping" => rpc_ok(id, json!({})),
            "shutdown" => rpc_ok(id, J::Null),
            "tools/list" | "tools.list" => rpc_ok(id, self.tools_list()),
            "tools/call" | "tools.call" => match self.call_tool(&req.params).await {
                Ok(out) => match serde_json::to_value(out) {
                    Ok(v) => rpc_ok(id, v),
                    Err(e) => protocol_err(id, INTERNAL_ERROR, "InternalError", e.to_string()),
                },
                Err(e) => {
                    tracing::warn!(kind = e.kind(), error = %e, "tools/call failed");
                    from_tool_error(id, &e)
                }
            },
            _ => rpc_err(
                id,
                METHOD_NOT_FOUND,
                format!("unknown method: {}", req.method),
                Some(json!({ "kind": "MethodNotFound" })),
            ),
        };
        tracing::trace!(response = ?resp, "response ready");
        Some(resp)
    }

    fn initialize(&self, id: J) -> RpcResp {
        let result = InitializeResult {
            protocol_version: self.protocol_version.clone(),
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: self.info.clone(),
        };
        match serde_json::to_value(result) {
            Ok(v) => rpc_ok(id, v),
            Err(e) => protocol_err(id, INTERNAL_ERROR, "InternalError", e.to_string()),
        }
    }

    fn tools_list(&self) -> J {
        json!({ "tools": self.registry.list() })
    }

    async fn call_tool(&self, params: &J) -> Result<CallToolResult, ToolError> {
        let params: CallToolParams = serde_json::from_value(params.clone())
            .map_err(|e| ToolError::validation("name", e.to_string()))?;
        let tool = self.registry.resolve(&params.name)?;
        let arguments = tool.input_schema().validate(params.arguments.as_ref())?;
        let outcome = tool.call(arguments).await;
        let label = if outcome.is_ok() { "ok" } else { "error" };
        metrics::counter!("mcp_tool_calls_total", "tool" => params.name.clone(), "outcome" => label)
            .increment(1);
        log_metric(&params.name, "calls", 1.0);
        outcome
    }
}

fn parse_error(message: String) -> RpcResp {
    protocol_err(J::Null, PARSE_ERROR, "ParseError", message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::registry::build_registry;

    fn server() -> McpServer {
        McpServer::new(
            build_registry().unwrap(),
            ServerInfo { name: "calc".into(), version: "0.1.0".into() },
            "2025-03-26",
        )
    }

    async fn call(line: &str) -> RpcResp {
        server().handle_line(line).await.expect("response expected")
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let resp = call(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "calc");
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["capabilities"]["tools"]["listChanged"], false);
        assert!(result["capabilities"].get("resources").is_none());
        assert!(result["capabilities"].get("prompts").is_none());
    }

    #[tokio::test]
    async fn tools_list_returns_expected_shape() {
        let resp = call(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        let tools = resp.result.unwrap()["tools"].clone();
        assert_eq!(tools[0]["name"], "sum");
        assert_eq!(tools[0]["title"], "Sum numbers");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["numbers"]));
    }

    #[tokio::test]
    async fn tools_call_sums() {
        let resp = call(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"sum","arguments":{"numbers":[1,2,3]}}}"#,
        )
        .await;
        assert_eq!(resp.id, json!(3));
        assert_eq!(resp.result.unwrap()["content"], json!([{ "type": "text", "text": "6" }]));
    }

    #[tokio::test]
    async fn tools_call_accepts_tool_alias() {
        let resp = call(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"tool":"sum","arguments":{"numbers":[2]}}}"#,
        )
        .await;
        assert_eq!(resp.result.unwrap()["content"][0]["text"], "2");
    }

    #[tokio::test]
    async fn tools_call_unknown_tool() {
        let resp = call(
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"subtract","arguments":{}}}"#,
        )
        .await;
        let e = resp.error.unwrap();
        assert_eq!(e.code, -32602);
        assert_eq!(e.data.unwrap()["kind"], "UnknownToolError");
    }

    #[tokio::test]
    async fn tools_call_missing_name() {
        let resp = call(r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{}}"#).await;
        let data = resp.error.unwrap().data.unwrap();
        assert_eq!(data["kind"], "ValidationError");
        assert_eq!(data["field"], "name");
    }

    #[tokio::test]
    async fn unknown_method_returns_method_not_found() {
        let resp = call(r#"{"jsonrpc":"2.0","id":6,"method":"nope"}"#).await;
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn parse_error_on_malformed_json() {
        let resp = call("{ not-json }").await;
        assert_eq!(resp.id, J::Null);
        let e = resp.error.unwrap();
        assert_eq!(e.code, -32700);
        assert_eq!(e.data.unwrap()["kind"], "ParseError");
    }

    #[tokio::test]
    async fn invalid_request_keeps_id() {
        let resp = call(r#"{"jsonrpc":"2.0","id":9}"#).await;
        assert_eq!(resp.id, json!(9));
        assert_eq!(resp.error.unwrap().code, -32600);

        let resp = call(r#"{"jsonrpc":"1.0","id":10,"method":"ping"}"#).await;
        assert_eq!(resp.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let svc = server();
        for line in [
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#,
            r#"{"jsonrpc":"1.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","method":7}"#,
            r#"{"method":"notifications/cancelled"}"#,
        ] {
            assert!(svc.handle_line(line).await.is_none(), "unexpected reply to {line}");
        }
    }

    #[tokio::test]
    async fn non_object_frame_is_invalid_request() {
        let resp = call("[1, 2]").await;
        assert_eq!(resp.id, J::Null);
        assert_eq!(resp.error.unwrap().code, -32600);
    }

    #[tokio::test]
    async fn ping_and_shutdown() {
        let resp = call(r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#).await;
        assert_eq!(resp.result, Some(json!({})));
        let resp = call(r#"{"jsonrpc":"2.0","id":11,"method":"shutdown"}"#).await;
        assert_eq!(resp.result, Some(J::Null));
    }

    #[tokio::test]
    async fn serve_skips_blank_lines_and_stops_at_eof() {
        let input: &[u8] = b"\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n   \n";
        let mut ch = LineChannel::new(input, Vec::new());
        server().serve(&mut ch).await.unwrap();
        let out = String::from_utf8(ch.into_writer()).unwrap();
        assert_eq!(out.lines().count(), 1);
    }

    #[tokio::test]
    async fn serve_answers_oversized_frame_and_continues() {
        let big = format!("{{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"{}\"}}", "x".repeat(200));
        let input = format!("{big}\n{{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}}\n");
        let mut ch = LineChannel::new(input.as_bytes(), Vec::new()).with_max_frame_bytes(64);
        server().serve(&mut ch).await.unwrap();
        let out: Vec<RpcResp> = String::from_utf8(ch.into_writer())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(out.len(), 2);
        let e = out[0].error.clone().unwrap();
        assert_eq!(e.code, -32700);
        assert!(e.message.contains("exceeds limit of 64 bytes"));
        assert_eq!(out[1].id, json!(2));
        assert_eq!(out[1].result, Some(json!({})));
    }
}
