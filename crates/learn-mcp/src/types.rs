//! MCP protocol types and JSON-RPC message structures

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn new(id: String, method: String, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 notification (no id, no response expected)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    pub fn new(method: String, params: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method,
            params,
        }
    }
}

/// JSON-RPC 2.0 error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// One logical JSON-RPC response, whatever encoding carried it.
///
/// Servers are free to send anything, so a body that is neither a result nor
/// a well-formed error is kept verbatim as `Unrecognized`.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcResponse {
    Success { id: Value, result: Value },
    Failure { id: Value, error: JsonRpcError },
    Unrecognized(Value),
}

impl JsonRpcResponse {
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::Unrecognized(value);
        };

        let id = map.get("id").cloned().unwrap_or(Value::Null);

        if let Some(result) = map.remove("result") {
            return Self::Success { id, result };
        }

        if let Some(error) = map
            .get("error")
            .and_then(|e| serde_json::from_value::<JsonRpcError>(e.clone()).ok())
        {
            return Self::Failure { id, error };
        }

        Self::Unrecognized(Value::Object(map))
    }

    /// The response an SSE stream decodes to when no frame carried a result.
    pub fn empty() -> Self {
        Self::Unrecognized(json!({}))
    }

    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Client capabilities
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experimental: Option<Value>,
}

/// Client information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: "learn-agent-mcp-client".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Initialize request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: ClientInfo,
}

/// The parts of an initialize result worth logging. Every field is optional
/// because servers differ in what they report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub server_info: Option<ServerInfo>,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Tool definition from MCP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_input_schema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// The schema to advertise, falling back to an empty object schema when
    /// the server sent nothing usable.
    pub fn parameters(&self) -> Value {
        if self.input_schema.is_object() {
            self.input_schema.clone()
        } else {
            default_input_schema()
        }
    }
}

pub fn default_input_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

/// Tool call parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_request_serialization() {
        let request = JsonRpcRequest::new("test-123".to_string(), "tools/list".to_string(), None);

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"id\":\"test-123\""));
        assert!(json.contains("\"method\":\"tools/list\""));
        assert!(!json.contains("params"));
    }

    #[test]
    fn test_notification_has_no_id() {
        let notification = JsonRpcNotification::new("notifications/initialized".to_string(), None);
        let json = serde_json::to_value(&notification).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(json["method"], "notifications/initialized");
    }

    #[test]
    fn test_initialize_params_are_camel_case() {
        let params = InitializeParams {
            protocol_version: "2024-11-05".to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: ClientInfo::default(),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["protocolVersion"], "2024-11-05");
        assert_eq!(json["capabilities"], json!({}));
        assert_eq!(json["clientInfo"]["name"], "learn-agent-mcp-client");
    }

    #[test]
    fn test_response_variants() {
        let success = JsonRpcResponse::from_value(json!({"jsonrpc": "2.0", "id": "1", "result": {"tools": []}}));
        assert_eq!(success.result(), Some(&json!({"tools": []})));

        let failure = JsonRpcResponse::from_value(json!({
            "jsonrpc": "2.0", "id": "2", "error": {"code": -32601, "message": "Method not found"}
        }));
        match failure {
            JsonRpcResponse::Failure { error, .. } => assert_eq!(error.code, -32601),
            other => panic!("expected failure, got {other:?}"),
        }

        assert_eq!(JsonRpcResponse::from_value(json!({})), JsonRpcResponse::empty());
        assert!(matches!(JsonRpcResponse::from_value(json!([1, 2])), JsonRpcResponse::Unrecognized(_)));
    }

    #[test]
    fn test_tool_descriptor_defaults() {
        let tool: ToolDescriptor = serde_json::from_value(json!({"name": "microsoft_docs_fetch"})).unwrap();
        assert_eq!(tool.description, None);
        assert_eq!(tool.parameters(), default_input_schema());

        let null_schema: ToolDescriptor =
            serde_json::from_value(json!({"name": "t", "inputSchema": null})).unwrap();
        assert_eq!(null_schema.parameters(), default_input_schema());
    }

    #[test]
    fn test_tool_descriptor_deserialization() {
        let json = r#"{
            "name": "microsoft_docs_search",
            "description": "Search official Microsoft documentation",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" }
                },
                "required": ["query"]
            }
        }"#;

        let tool: ToolDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(tool.name, "microsoft_docs_search");
        assert_eq!(tool.description.as_deref(), Some("Search official Microsoft documentation"));
        assert_eq!(tool.parameters()["required"][0], "query");
    }
}
