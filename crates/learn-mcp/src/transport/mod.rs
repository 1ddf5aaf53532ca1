//! Transport layer for MCP communication
//!
//! The only transport shipped is Streamable HTTP: every JSON-RPC message is
//! an HTTP POST and the answer comes back either as a JSON body or as an SSE
//! stream (see [`sse`]).

use async_trait::async_trait;
use learn_core::Result;
use serde_json::Value;
use std::fmt::Debug;

use crate::types::JsonRpcResponse;

pub mod http;
pub mod sse;

pub use http::HttpTransport;
pub use sse::parse_sse_body;

/// Header carrying the server-issued session identifier.
pub const SESSION_HEADER: &str = "Mcp-Session-Id";

/// Transport trait for MCP communication
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Send a JSON-RPC request and wait for its single logical response
    async fn request(&mut self, method: &str, params: Option<Value>) -> Result<JsonRpcResponse>;

    /// Send a JSON-RPC notification; whatever comes back is ignored
    async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()>;

    /// Session identifier captured from the server, if any
    fn session_id(&self) -> Option<&str>;

    /// Release the connection and forget the session
    async fn close(&mut self) -> Result<()>;
}
