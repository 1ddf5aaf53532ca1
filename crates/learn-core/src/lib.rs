use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single entry in the conversation history.
///
/// The serialized form is tagged by `role`, which matches the shape most
/// chat-completion endpoints expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    System {
        content: String,
    },
    User {
        content: String,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Tool,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System { content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User { content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> MessageRole {
        match self {
            Message::System { .. } => MessageRole::System,
            Message::User { .. } => MessageRole::User,
            Message::Assistant { .. } => MessageRole::Assistant,
            Message::Tool { .. } => MessageRole::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool invocations carried by an assistant message; empty for every other role.
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A model-issued request to run a named tool.
///
/// `arguments` is kept exactly as the model produced it (a JSON-encoded
/// string) so it can be echoed back in history unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    /// Decode the argument string into a JSON object. A blank string means
    /// "no arguments"; scalars and arrays are rejected.
    pub fn parse_arguments(&self) -> Result<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        serde_json::from_str::<serde_json::Map<String, Value>>(&self.arguments)
            .map(Value::Object)
            .map_err(|source| LearnError::MalformedArguments {
                tool: self.name.clone(),
                source,
            })
    }
}

/// Tool schema as handed to the completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// What the completion endpoint answered: text, tool invocations, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    pub content: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
}

impl Completion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_invocations: Vec::new(),
        }
    }

    pub fn with_tools(content: Option<String>, tool_invocations: Vec<ToolInvocation>) -> Self {
        Self {
            content,
            tool_invocations,
        }
    }

    pub fn has_tool_invocations(&self) -> bool {
        !self.tool_invocations.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum LearnError {
    #[error("HTTP {status} from MCP server: {body}")]
    Transport { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("MCP client used before initialize")]
    NotInitialized,

    #[error("MCP client is closed")]
    Closed,

    #[error("Malformed arguments for tool '{tool}': {source}")]
    MalformedArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tool execution failed for '{tool}': {source}")]
    ToolExecution {
        tool: String,
        #[source]
        source: Box<LearnError>,
    },

    #[error("Completion request failed: {0}")]
    Completion(String),

    #[error("Tool loop did not finish within {0} completion rounds")]
    IterationLimit(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LearnError>;

/// The chat-completion endpoint the agent talks to.
///
/// Implementations own whatever identifies the target model; callers only
/// hand over the full message list and the current tool schema.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization_is_role_tagged() {
        let message = Message::assistant_with_tools(
            "",
            vec![ToolInvocation::new("call_1", "microsoft_docs_search", r#"{"query":"blob"}"#)],
        );
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["tool_calls"][0]["name"], "microsoft_docs_search");

        let plain = serde_json::to_value(Message::assistant("done")).unwrap();
        assert!(plain.get("tool_calls").is_none());
    }

    #[test]
    fn test_parse_arguments() {
        let invocation = ToolInvocation::new("1", "microsoft_docs_fetch", r#"{"url":"https://learn.microsoft.com"}"#);
        let args = invocation.parse_arguments().unwrap();
        assert_eq!(args["url"], "https://learn.microsoft.com");

        let blank = ToolInvocation::new("2", "list", "  ");
        assert_eq!(blank.parse_arguments().unwrap(), serde_json::json!({}));
    }

    #[test]
    fn test_malformed_arguments_name_the_tool() {
        let invocation = ToolInvocation::new("1", "microsoft_docs_search", "{\"query\": ");
        match invocation.parse_arguments() {
            Err(LearnError::MalformedArguments { tool, .. }) => assert_eq!(tool, "microsoft_docs_search"),
            other => panic!("expected MalformedArguments, got {other:?}"),
        }
    }

    #[test]
    fn test_non_object_arguments_are_malformed() {
        for raw in ["42", "[1]", "\"query\"", "null"] {
            let invocation = ToolInvocation::new("t1", "microsoft_docs_search", raw);
            assert!(
                matches!(invocation.parse_arguments(), Err(LearnError::MalformedArguments { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_message_accessors() {
        let tool = Message::tool_result("call_9", "result text");
        assert_eq!(tool.role(), MessageRole::Tool);
        assert_eq!(tool.content(), "result text");
        assert!(tool.tool_calls().is_empty());
    }
}
