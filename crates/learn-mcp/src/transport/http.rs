//! Streamable HTTP transport for MCP servers

use async_trait::async_trait;
use learn_core::{LearnError, Result};
use learn_config::McpSettings;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{parse_sse_body, Transport, SESSION_HEADER};
use crate::types::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};

const ACCEPT_BOTH: &str = "application/json, text/event-stream";

/// POSTs every JSON-RPC message to a single endpoint and normalizes the
/// JSON / SSE answer into one [`JsonRpcResponse`].
pub struct HttpTransport {
    /// MCP endpoint (POST target)
    url: String,

    /// HTTP client with the configured timeout and extra headers
    client: reqwest::Client,

    /// Session id, set once the server sends one back
    session_id: Option<String>,

    closed: bool,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("url", &self.url)
            .field("session_id", &self.session_id)
            .field("closed", &self.closed)
            .finish()
    }
}

impl HttpTransport {
    /// Create a new HTTP transport. No network I/O happens here.
    pub fn new(url: String, headers: &HashMap<String, String>, timeout_ms: u64) -> Result<Self> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(LearnError::ConfigError(
                "MCP server URL must start with http:// or https://".into(),
            ));
        }

        let mut default_headers = HeaderMap::new();
        for (key, value) in headers {
            let header_name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LearnError::ConfigError(format!("Invalid header name '{}': {}", key, e)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|e| LearnError::ConfigError(format!("Invalid header value for '{}': {}", key, e)))?;
            default_headers.insert(header_name, header_value);
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .default_headers(default_headers)
            .build()
            .map_err(|e| LearnError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            client,
            session_id: None,
            closed: false,
        })
    }

    pub fn from_settings(settings: &McpSettings) -> Result<Self> {
        Self::new(settings.url.clone(), &settings.headers, settings.timeout_ms)
    }

    /// POST one envelope and hand back the declared content type and raw body.
    async fn exchange(&mut self, envelope: &impl Serialize) -> Result<(String, String)> {
        if self.closed {
            return Err(LearnError::Closed);
        }

        let mut request = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_BOTH);

        if let Some(session_id) = &self.session_id {
            request = request.header(SESSION_HEADER, session_id.as_str());
        }

        let response = request
            .json(envelope)
            .send()
            .await
            .map_err(|e| LearnError::Http(format!("Failed to send HTTP request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LearnError::Transport {
                status: status.as_u16(),
                body,
            });
        }

        if let Some(session_id) = response
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if self.session_id.as_deref() != Some(session_id) {
                info!("MCP session established: {}", session_id);
            }
            self.session_id = Some(session_id.to_string());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| LearnError::Http(format!("Failed to read response body: {}", e)))?;

        Ok((content_type, body))
    }
}

/// Turn a response body into a JSON value according to its content type.
pub fn decode_body(content_type: &str, body: &str) -> Result<Value> {
    if content_type.contains("text/event-stream") {
        return Ok(parse_sse_body(body));
    }
    if body.trim().is_empty() {
        return Ok(json!({}));
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse> {
        let request = JsonRpcRequest::new(Uuid::new_v4().to_string(), method.to_string(), params);
        debug!("Sending MCP request {} ({})", request.method, request.id);

        let (content_type, body) = self.exchange(&request).await?;
        let value = decode_body(&content_type, &body)?;

        Ok(JsonRpcResponse::from_value(value))
    }

    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        let notification = JsonRpcNotification::new(method.to_string(), params);
        debug!("Sending MCP notification {}", notification.method);

        self.exchange(&notification).await?;
        Ok(())
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn close(&mut self) -> Result<()> {
        info!("Closing MCP transport for {}", self.url);
        self.session_id = None;
        self.closed = true;
        Ok(())
    }
}
