//! MCP (Model Context Protocol) client over Streamable HTTP.
//!
//! [`McpClient`] runs the initialize handshake, discovers tools and calls
//! them; the [`transport`] module deals with the wire (JSON-RPC envelopes,
//! session header, JSON vs. SSE bodies).

pub mod client;
pub mod transport;
pub mod types;

pub use client::{
    extract_text, McpClient, CODE_SAMPLE_SEARCH_TOOL, DOCS_FETCH_TOOL, DOCS_SEARCH_TOOL,
};
pub use transport::{HttpTransport, Transport, SESSION_HEADER};
pub use types::{
    ClientInfo, InitializeResult, JsonRpcError, JsonRpcResponse, ServerInfo, ToolDescriptor,
};
