//! MCP client implementation

use learn_core::{LearnError, Result, ToolDefinition};
use learn_config::McpSettings;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::transport::{HttpTransport, Transport};
use crate::types::{
    ClientCapabilities, ClientInfo, InitializeParams, InitializeResult, JsonRpcResponse,
    ToolCallParams, ToolDescriptor,
};

pub const DOCS_SEARCH_TOOL: &str = "microsoft_docs_search";
pub const DOCS_FETCH_TOOL: &str = "microsoft_docs_fetch";
pub const CODE_SAMPLE_SEARCH_TOOL: &str = "microsoft_code_sample_search";

/// MCP client for communicating with an MCP server
pub struct McpClient<T: Transport = HttpTransport> {
    /// Transport for communication
    transport: T,

    protocol_version: String,

    client_info: ClientInfo,

    /// Server details reported by initialize
    server: Option<InitializeResult>,

    /// Tools from the most recent successful tools/list
    tools: Vec<ToolDescriptor>,

    initialized: bool,
}

impl McpClient<HttpTransport> {
    /// Build a client over Streamable HTTP. Call [`McpClient::initialize`] next.
    pub fn connect(settings: &McpSettings) -> Result<Self> {
        info!("Connecting to MCP server: {}", settings.url);

        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::new(transport)
            .with_protocol_version(settings.protocol_version.clone())
            .with_client_info(ClientInfo {
                name: settings.client_name.clone(),
                version: settings.client_version.clone(),
            }))
    }
}

impl<T: Transport> McpClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            protocol_version: learn_config::DEFAULT_PROTOCOL_VERSION.to_string(),
            client_info: ClientInfo::default(),
            server: None,
            tools: Vec::new(),
            initialized: false,
        }
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn with_client_info(mut self, client_info: ClientInfo) -> Self {
        self.client_info = client_info;
        self
    }

    /// Run the initialize handshake: `initialize` followed by the
    /// `notifications/initialized` notification.
    pub async fn initialize(&mut self) -> Result<Value> {
        info!("Initializing MCP session");

        let params = InitializeParams {
            protocol_version: self.protocol_version.clone(),
            capabilities: ClientCapabilities::default(),
            client_info: self.client_info.clone(),
        };

        let response = self
            .transport
            .request("initialize", Some(serde_json::to_value(params)?))
            .await?;

        let result = match response {
            JsonRpcResponse::Success { result, .. } => result,
            JsonRpcResponse::Failure { error, .. } => {
                return Err(LearnError::Rpc {
                    code: error.code,
                    message: format!("Failed to initialize MCP connection: {}", error.message),
                });
            }
            JsonRpcResponse::Unrecognized(raw) => {
                warn!("Initialize response carried no result");
                raw
            }
        };

        let server: InitializeResult = serde_json::from_value(result.clone()).unwrap_or_default();
        if let Some(ref server_info) = server.server_info {
            info!(
                "Connected to MCP server: {} v{}",
                server_info.name,
                server_info.version.as_deref().unwrap_or("?")
            );
        }
        self.server = Some(server);

        self.transport.notify("notifications/initialized", None).await?;
        debug!("Sent notifications/initialized to server");

        self.initialized = true;
        Ok(result)
    }

    /// Fetch the tool list. A response without a usable `tools` array keeps
    /// the previously known tools.
    pub async fn list_tools(&mut self) -> Result<Vec<ToolDescriptor>> {
        self.ensure_initialized()?;
        debug!("Listing tools from MCP server");

        let response = self.transport.request("tools/list", None).await?;

        match response.result().and_then(|result| result.get("tools")) {
            Some(tools) => match serde_json::from_value::<Vec<ToolDescriptor>>(tools.clone()) {
                Ok(tools) => {
                    info!("Discovered {} tools from MCP server", tools.len());
                    self.tools = tools;
                }
                Err(e) => {
                    warn!("Ignoring malformed tools/list result: {}", e);
                }
            },
            None => {
                warn!("tools/list response had no tools; keeping {} known tools", self.tools.len());
            }
        }

        Ok(self.tools.clone())
    }

    /// Call a tool and return its result object.
    ///
    /// Servers that flatten the result into the top level of the response get
    /// the raw response back.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<Value> {
        self.ensure_initialized()?;
        debug!("Calling MCP tool '{}'", name);

        let params = ToolCallParams {
            name: name.to_string(),
            arguments,
        };

        let response = self
            .transport
            .request("tools/call", Some(serde_json::to_value(params)?))
            .await?;

        match response {
            JsonRpcResponse::Success { result, .. } => Ok(result),
            JsonRpcResponse::Failure { error, .. } => Err(LearnError::Rpc {
                code: error.code,
                message: format!("Tool '{}' execution failed: {}", name, error.message),
            }),
            JsonRpcResponse::Unrecognized(raw) => Ok(raw),
        }
    }

    pub async fn search_docs(&mut self, query: &str) -> Result<String> {
        let result = self.call_tool(DOCS_SEARCH_TOOL, json!({ "query": query })).await?;
        Ok(extract_text(&result))
    }

    pub async fn fetch_doc(&mut self, url: &str) -> Result<String> {
        let result = self.call_tool(DOCS_FETCH_TOOL, json!({ "url": url })).await?;
        Ok(extract_text(&result))
    }

    pub async fn search_code_samples(&mut self, query: &str, language: Option<&str>) -> Result<String> {
        let mut args = json!({ "query": query });
        if let Some(language) = language {
            args["language"] = json!(language);
        }
        let result = self.call_tool(CODE_SAMPLE_SEARCH_TOOL, args).await?;
        Ok(extract_text(&result))
    }

    /// Tools as of the last successful `list_tools` call
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Current tools projected to the completion endpoint's schema
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                name: tool.name.clone(),
                description: tool.description.clone().unwrap_or_default(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server.as_ref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.transport.session_id()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Close the client connection
    pub async fn close(&mut self) -> Result<()> {
        debug!("Closing MCP client");
        self.initialized = false;
        self.transport.close().await
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(LearnError::NotInitialized)
        }
    }
}

/// Flatten a tool result into text.
///
/// Text blocks of a `content` array are joined with newlines; anything else is
/// rendered as JSON. Never fails.
pub fn extract_text(result: &Value) -> String {
    match result.get("content").and_then(Value::as_array) {
        Some(blocks) => blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .map(|block| block.get("text").and_then(Value::as_str).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\n"),
        None => match result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}
