//! The tool-calling loop that answers questions from Microsoft Learn docs.
//!
//! An [`Agent`] owns one MCP client and one [`Conversation`]. Each call to
//! [`Agent::chat`] runs completion rounds until the model answers without
//! asking for tools, executing every requested tool in order in between.

use learn_config::AgentConfig;
use learn_core::{CompletionProvider, LearnError, Message, Result, ToolDefinition, ToolInvocation};
use learn_mcp::{extract_text, HttpTransport, McpClient, ToolDescriptor, Transport};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub mod conversation;
pub mod observer;

pub use conversation::Conversation;
pub use observer::{NoopObserver, ToolObserver};

pub struct Agent<T: Transport = HttpTransport> {
    provider: Arc<dyn CompletionProvider>,
    mcp: McpClient<T>,
    conversation: Conversation,
    system_prompt: String,
    max_iterations: usize,
    observer: Box<dyn ToolObserver>,
}

impl Agent<HttpTransport> {
    /// Connect to the configured MCP server, run the handshake and discover
    /// its tools.
    pub async fn connect(config: &AgentConfig, provider: Arc<dyn CompletionProvider>) -> Result<Self> {
        let mut mcp = McpClient::connect(&config.mcp)?;
        mcp.initialize().await?;
        let tools = mcp.list_tools().await?;
        info!("Connected to {} with {} tools", config.mcp.url, tools.len());

        Ok(Self::new(provider, mcp, config))
    }
}

impl<T: Transport> Agent<T> {
    pub fn new(provider: Arc<dyn CompletionProvider>, mcp: McpClient<T>, config: &AgentConfig) -> Self {
        Self {
            provider,
            mcp,
            conversation: Conversation::new(),
            system_prompt: config.agent.get_system_prompt(),
            max_iterations: config.agent.max_iterations,
            observer: Box::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: impl ToolObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Run one user turn to completion and return the final answer.
    ///
    /// On error the history keeps everything appended before the failure;
    /// callers that want a clean slate can [`truncate`](Self::truncate) back
    /// to the length they saw before the turn.
    #[instrument(skip(self, input))]
    pub async fn chat(&mut self, input: &str) -> Result<String> {
        self.conversation.push(Message::user(input));

        for round in 1..=self.max_iterations {
            let definitions = self.mcp.tool_definitions();
            let tools: Option<&[ToolDefinition]> =
                if definitions.is_empty() { None } else { Some(definitions.as_slice()) };

            let messages = self.conversation.request_messages(&self.system_prompt);
            debug!("Completion round {} with {} messages", round, messages.len());

            let completion = self.provider.complete(&messages, tools).await?;

            if !completion.has_tool_invocations() {
                let answer = completion.content.unwrap_or_default();
                self.conversation.push(Message::assistant(answer.clone()));
                return Ok(answer);
            }

            let invocations = completion.tool_invocations;
            info!("Model requested {} tool call(s)", invocations.len());
            self.conversation.push(Message::assistant_with_tools(
                completion.content.unwrap_or_default(),
                invocations.clone(),
            ));

            for invocation in &invocations {
                let text = self.execute_tool(invocation).await?;
                self.conversation.push(Message::tool_result(invocation.id.clone(), text));
            }
        }

        warn!("Turn stopped after {} completion rounds", self.max_iterations);
        Err(LearnError::IterationLimit(self.max_iterations))
    }

    async fn execute_tool(&mut self, invocation: &ToolInvocation) -> Result<String> {
        let arguments = invocation.parse_arguments()?;
        self.observer.on_tool_call(&invocation.name, &arguments);

        let result = self
            .mcp
            .call_tool(&invocation.name, arguments)
            .await
            .map_err(|source| LearnError::ToolExecution {
                tool: invocation.name.clone(),
                source: Box::new(source),
            })?;

        let text = extract_text(&result);
        debug!("Tool {} returned {} chars", invocation.name, text.len());
        self.observer.on_tool_result(&invocation.name, &text);

        Ok(text)
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear_conversation(&mut self) {
        self.conversation.clear();
    }

    /// Drop history entries past `len`.
    pub fn truncate(&mut self, len: usize) {
        self.conversation.truncate(len);
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        self.mcp.tools()
    }

    pub async fn close(&mut self) -> Result<()> {
        self.mcp.close().await
    }
}
