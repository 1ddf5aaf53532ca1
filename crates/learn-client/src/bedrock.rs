use aws_config::Region;
use aws_sdk_bedrockruntime as bedrock;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, SystemContentBlock, Tool,
    ToolConfiguration, ToolInputSchema, ToolResultBlock, ToolResultContentBlock, ToolSpecification,
    ToolUseBlock,
};
use aws_smithy_types::{Document, Number};
use async_trait::async_trait;
use learn_config::{AgentConfig, ProviderSettings};
use learn_core::{
    Completion, CompletionProvider, LearnError, Message, Result, ToolDefinition, ToolInvocation,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Stand-in for an assistant reply that carried no text.
const EMPTY_ASSISTANT_TEXT: &str = "(no response)";

/// Completion provider backed by the Bedrock Converse API.
pub struct BedrockProvider {
    client: bedrock::Client,
    model_id: String,
    temperature: f32,
    max_tokens: usize,
}

impl BedrockProvider {
    pub async fn new(config: &AgentConfig) -> Result<Self> {
        let sdk_config = Self::build_aws_config(&config.provider).await;
        Ok(Self {
            client: bedrock::Client::new(&sdk_config),
            model_id: config.agent.model.clone(),
            temperature: config.agent.temperature,
            max_tokens: config.agent.max_tokens,
        })
    }

    async fn build_aws_config(settings: &ProviderSettings) -> aws_config::SdkConfig {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));

        if let Some(profile) = &settings.profile {
            info!("Using AWS profile: {}", profile);
            loader = loader.profile_name(profile);
        }

        let sdk_config = loader.load().await;
        debug!("AWS config loaded for region: {}", settings.region);
        sdk_config
    }
}

#[async_trait]
impl CompletionProvider for BedrockProvider {
    async fn complete(&self, messages: &[Message], tools: Option<&[ToolDefinition]>) -> Result<Completion> {
        let (system, conversation) = to_bedrock_messages(messages)?;

        let inference_config = InferenceConfiguration::builder()
            .max_tokens(self.max_tokens as i32)
            .temperature(self.temperature)
            .build();

        let mut request = self
            .client
            .converse()
            .model_id(&self.model_id)
            .set_messages(Some(conversation))
            .inference_config(inference_config);

        for text in system {
            request = request.system(SystemContentBlock::Text(text));
        }

        if let Some(tools) = tools.filter(|t| !t.is_empty()) {
            request = request.tool_config(build_tool_config(tools)?);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LearnError::Completion(format!("Bedrock API error: {e}")))?;

        let message = response
            .output()
            .and_then(|output| output.as_message().ok())
            .ok_or_else(|| LearnError::Completion("No message in response".into()))?;

        from_bedrock_message(message)
    }
}

/// Split the history into system prompts and Converse messages.
///
/// Consecutive tool results are merged into a single user message, which is
/// how Converse expects answers to a multi-tool assistant turn.
pub fn to_bedrock_messages(messages: &[Message]) -> Result<(Vec<String>, Vec<bedrock::types::Message>)> {
    let mut system = Vec::new();
    let mut converted = Vec::new();
    let mut pending_results: Vec<ContentBlock> = Vec::new();

    for message in messages {
        if !matches!(message, Message::Tool { .. }) && !pending_results.is_empty() {
            converted.push(build_message(ConversationRole::User, std::mem::take(&mut pending_results))?);
        }

        match message {
            Message::System { content } => system.push(content.clone()),
            Message::User { content } => {
                converted.push(build_message(ConversationRole::User, vec![ContentBlock::Text(content.clone())])?);
            }
            Message::Assistant { content, tool_calls } => {
                let mut blocks = Vec::new();
                if !content.trim().is_empty() {
                    blocks.push(ContentBlock::Text(content.clone()));
                } else if tool_calls.is_empty() {
                    // Converse rejects blank text blocks and empty messages
                    blocks.push(ContentBlock::Text(EMPTY_ASSISTANT_TEXT.to_string()));
                }
                for call in tool_calls {
                    blocks.push(ContentBlock::ToolUse(build_tool_use(call)?));
                }
                converted.push(build_message(ConversationRole::Assistant, blocks)?);
            }
            Message::Tool { tool_call_id, content } => {
                let result = ToolResultBlock::builder()
                    .tool_use_id(tool_call_id)
                    .content(ToolResultContentBlock::Text(content.clone()))
                    .build()
                    .map_err(|e| LearnError::Completion(format!("Failed to build tool result: {e}")))?;
                pending_results.push(ContentBlock::ToolResult(result));
            }
        }
    }

    if !pending_results.is_empty() {
        converted.push(build_message(ConversationRole::User, pending_results)?);
    }

    Ok((system, converted))
}

fn build_message(role: ConversationRole, content: Vec<ContentBlock>) -> Result<bedrock::types::Message> {
    bedrock::types::Message::builder()
        .role(role)
        .set_content(Some(content))
        .build()
        .map_err(|e| LearnError::Completion(format!("Failed to build message: {e}")))
}

fn build_tool_use(call: &ToolInvocation) -> Result<ToolUseBlock> {
    // Arguments already went through parse_arguments in the agent loop; a
    // replayed history entry that no longer parses is sent as an empty input.
    let input = call
        .parse_arguments()
        .map(|value| json_to_document(&value))
        .unwrap_or_else(|_| Document::Object(HashMap::new()));

    ToolUseBlock::builder()
        .tool_use_id(&call.id)
        .name(&call.name)
        .input(input)
        .build()
        .map_err(|e| LearnError::Completion(format!("Failed to build tool use for '{}': {e}", call.name)))
}

/// Read text and tool-use blocks out of a Converse response message.
pub fn from_bedrock_message(message: &bedrock::types::Message) -> Result<Completion> {
    let mut text = Vec::new();
    let mut invocations = Vec::new();

    for block in message.content() {
        if let Ok(t) = block.as_text() {
            text.push(t.to_string());
        } else if let Ok(tool_use) = block.as_tool_use() {
            let arguments = serde_json::to_string(&document_to_json(tool_use.input()))?;
            invocations.push(ToolInvocation::new(tool_use.tool_use_id(), tool_use.name(), arguments));
        }
    }

    let content = if text.is_empty() { None } else { Some(text.join("")) };
    Ok(Completion::with_tools(content, invocations))
}

fn build_tool_config(tools: &[ToolDefinition]) -> Result<ToolConfiguration> {
    info!("Building tool config for {} tools", tools.len());

    let mut specs = Vec::with_capacity(tools.len());
    for tool in tools {
        let schema = match &tool.parameters {
            Value::Object(_) => json_to_document(&tool.parameters),
            other => {
                warn!("Tool '{}' has a non-object schema ({}); sending an empty one", tool.name, other);
                Document::Object(HashMap::new())
            }
        };

        let spec = ToolSpecification::builder()
            .name(&tool.name)
            .description(&tool.description)
            .input_schema(ToolInputSchema::Json(schema))
            .build()
            .map_err(|e| LearnError::Completion(format!("Failed to build tool spec for '{}': {e}", tool.name)))?;

        specs.push(Tool::ToolSpec(spec));
    }

    ToolConfiguration::builder()
        .set_tools(Some(specs))
        .build()
        .map_err(|e| LearnError::Completion(e.to_string()))
}

pub fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

pub fn document_to_json(doc: &Document) -> Value {
    match doc {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        // NaN and infinities have no JSON form
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(document_to_json).collect()),
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}
