//! OpenAI-compatible chat completions (Azure AI Foundry model inference).

use async_trait::async_trait;
use learn_config::AgentConfig;
use learn_core::{
    Completion, CompletionProvider, LearnError, Message, Result, ToolDefinition, ToolInvocation,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 120;

pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    api_version: Option<String>,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    /// Absent or `null` on plain text replies.
    #[serde(default)]
    tool_calls: Option<Vec<ChoiceToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChoiceToolCall {
    id: String,
    function: ChoiceFunction,
}

#[derive(Debug, Deserialize)]
struct ChoiceFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl OpenAiProvider {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        let endpoint = config
            .provider
            .endpoint
            .clone()
            .filter(|e| !e.is_empty())
            .ok_or_else(|| LearnError::ConfigError("provider.endpoint is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| LearnError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: config.provider.api_key.clone(),
            api_version: config.provider.api_version.clone(),
            model: config.agent.model.clone(),
            temperature: config.agent.temperature,
            max_tokens: config.agent.max_tokens,
        })
    }

    fn completions_url(&self) -> String {
        match &self.api_version {
            Some(version) => format!("{}/chat/completions?api-version={}", self.endpoint, version),
            None => format!("{}/chat/completions", self.endpoint),
        }
    }

    pub fn build_request_body(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(message_to_json).collect::<Vec<_>>(),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            body["tools"] = Value::Array(tools.iter().map(tool_to_json).collect());
        }

        body
    }
}

fn message_to_json(message: &Message) -> Value {
    match message {
        Message::System { content } => json!({ "role": "system", "content": content }),
        Message::User { content } => json!({ "role": "user", "content": content }),
        Message::Assistant { content, tool_calls } if tool_calls.is_empty() => {
            json!({ "role": "assistant", "content": content })
        }
        Message::Assistant { content, tool_calls } => json!({
            "role": "assistant",
            "content": content,
            "tool_calls": tool_calls.iter().map(|call| json!({
                "id": call.id,
                "type": "function",
                "function": { "name": call.name, "arguments": call.arguments }
            })).collect::<Vec<_>>(),
        }),
        Message::Tool { tool_call_id, content } => json!({
            "role": "tool",
            "tool_call_id": tool_call_id,
            "content": content,
        }),
    }
}

fn tool_to_json(tool: &ToolDefinition) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        }
    })
}

/// Read the first choice of a chat-completions response body.
pub fn parse_chat_response(body: Value) -> Result<Completion> {
    let response: ChatResponse = serde_json::from_value(body)
        .map_err(|e| LearnError::Completion(format!("Unexpected response shape: {}", e)))?;

    let message = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LearnError::Completion("Response contained no choices".into()))?
        .message;

    let tool_invocations = message
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|call| ToolInvocation::new(call.id, call.function.name, call.function.arguments))
        .collect();

    Ok(Completion::with_tools(message.content, tool_invocations))
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn complete(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> Result<Completion> {
        let body = self.build_request_body(messages, tools);
        debug!("Requesting completion from {} with {} messages", self.model, messages.len());

        let mut request = self.client.post(self.completions_url()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.header("api-key", api_key.as_str()).bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LearnError::Completion(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LearnError::Completion(format!("HTTP {}: {}", status, text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LearnError::Completion(format!("Invalid JSON in response: {}", e)))?;

        parse_chat_response(body)
    }
}
