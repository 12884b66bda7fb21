//! JSON-RPC 2.0 envelope and the MCP message shapes this server speaks.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use super::error::ToolError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const TOOL_ERROR: i32 = -32000;

// --- JSON-RPC structures ---

#[derive(Deserialize, Debug)]
pub struct RpcReq {
    pub jsonrpc: String,
    /// Absent for notifications.
    #[serde(default)]
    pub id: Option<J>,
    pub method: String,
    #[serde(default)]
    pub params: J,
}

impl RpcReq {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcResp {
    pub jsonrpc: String,
    pub id: J,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

pub fn ok(id: J, result: J) -> RpcResp {
    RpcResp { jsonrpc: "2.0".into(), id, result: Some(result), error: None }
}

pub fn err(id: J, code: i32, msg: impl Into<String>, data: Option<J>) -> RpcResp {
    RpcResp {
        jsonrpc: "2.0".into(),
        id,
        result: None,
        error: Some(RpcErr { code, message: msg.into(), data }),
    }
}

/// Protocol-level error tagged with a `kind`, for failures outside tool dispatch.
pub fn protocol_err(id: J, code: i32, kind: &str, msg: impl Into<String>) -> RpcResp {
    err(id, code, msg, Some(serde_json::json!({ "kind": kind })))
}

pub fn from_tool_error(id: J, e: &ToolError) -> RpcResp {
    err(id, e.code(), e.to_string(), Some(e.data()))
}

// --- MCP payloads ---

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: J,
    pub server_info: ServerInfo,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// `tools/call` params. `tool` is accepted as an alias of `name`.
#[derive(Deserialize, Debug)]
pub struct CallToolParams {
    #[serde(alias = "tool")]
    pub name: String,
    #[serde(default)]
    pub arguments: Option<J>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_serializes_initialize_result_in_camel_case() {
        let v = InitializeResult {
            protocol_version: "2025-03-26".into(),
            capabilities: json!({}),
            server_info: ServerInfo { name: "calc".into(), version: "0.1".into() },
        };
        let s = serde_json::to_string(&v).unwrap();
        assert!(s.contains("serverInfo"));
        assert!(s.contains("protocolVersion"));
    }

    #[test]
    fn it_parses_notification_without_id() {
        let req: RpcReq =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .unwrap();
        assert!(req.is_notification());
        assert_eq!(req.params, J::Null);
    }

    #[test]
    fn it_omits_error_on_success() {
        let s = serde_json::to_value(ok(json!(1), json!({"x": 1}))).unwrap();
        assert!(s.get("error").is_none());
        assert_eq!(s["result"]["x"], 1);
    }

    #[test]
    fn it_maps_tool_error_into_envelope() {
        let resp = from_tool_error(json!(7), &ToolError::UnknownTool("subtract".into()));
        let e = resp.error.unwrap();
        assert_eq!(e.code, INVALID_PARAMS);
        assert_eq!(e.data.unwrap()["kind"], "UnknownToolError");
        assert!(resp.result.is_none());
    }

    #[test]
    fn call_params_accept_tool_alias() {
        let p: CallToolParams = serde_json::from_value(json!({"tool": "sum"})).unwrap();
        assert_eq!(p.name, "sum");
        assert!(p.arguments.is_none());
    }
}
