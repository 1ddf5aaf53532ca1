//! Completion providers for the Learn agent.
//!
//! Two backends sit behind [`CompletionProvider`]: an OpenAI-compatible
//! chat-completions endpoint (Azure AI Foundry) and AWS Bedrock Converse.

use learn_config::{AgentConfig, ProviderKind};
use learn_core::{CompletionProvider, Result};
use std::sync::Arc;
use tracing::info;

pub mod bedrock;
pub mod openai;
pub mod ui;

pub use bedrock::BedrockProvider;
pub use openai::OpenAiProvider;
pub use ui::{display_tool_call, display_tool_result, get_tool_display_name, get_tool_emoji};

/// Build the provider selected by `provider.kind`.
pub async fn build_provider(config: &AgentConfig) -> Result<Arc<dyn CompletionProvider>> {
    config.validate_provider()?;
    info!("Using {:?} completion provider with model {}", config.provider.kind, config.agent.model);

    let provider: Arc<dyn CompletionProvider> = match config.provider.kind {
        ProviderKind::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        ProviderKind::Bedrock => Arc::new(BedrockProvider::new(config).await?),
    };

    Ok(provider)
}
