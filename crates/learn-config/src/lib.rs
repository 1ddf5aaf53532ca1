use learn_core::{LearnError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

pub mod env_substitution;

pub use env_substitution::substitute_env_vars;

pub const DEFAULT_MCP_URL: &str = "https://learn.microsoft.com/api/mcp";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant with access to Microsoft Learn documentation.
Use the available tools to search and fetch official Microsoft documentation when users ask about:
- Azure services and configurations
- .NET, C#, Python SDKs
- Microsoft 365, Power Platform
- Developer tools and best practices

Always cite your sources with documentation URLs when providing information from Microsoft docs.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub mcp: McpSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Upper bound on completion rounds within a single turn.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions (Azure AI Foundry inference).
    #[default]
    OpenAi,
    Bedrock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default)]
    pub kind: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpSettings {
    #[serde(default = "default_mcp_url")]
    pub url: String,
    /// Per-request ceiling in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
    /// Extra headers sent with every MCP request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl AgentConfig {
    /// Read a config file and apply the environment overrides on top of it.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| LearnError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::parse_yaml(&content)?;
        config.expand_env_vars();
        config.validate()?;

        Ok(config)
    }

    /// Parse a YAML document. Only explicit `${VAR}` placeholders consult the
    /// environment; the well-known overrides are applied by [`Self::from_yaml`]
    /// and [`Self::load`].
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = Self::parse_yaml(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(yaml: &str) -> Result<Self> {
        let mut raw: Value = serde_yaml::from_str(yaml)
            .map_err(|e| LearnError::ConfigError(format!("Failed to parse YAML: {}", e)))?;

        // An empty document parses as null
        if raw.is_null() {
            raw = Value::Object(serde_json::Map::new());
        }

        substitute_env_vars(&mut raw)?;

        serde_json::from_value(raw)
            .map_err(|e| LearnError::ConfigError(format!("Invalid configuration: {}", e)))
    }

    /// Load from `path` when given, else from the default location when it
    /// exists, else fall back to defaults plus environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_yaml(path);
        }

        let default_path = Self::default_config_path();
        if default_path.exists() {
            return Self::from_yaml(default_path);
        }

        let mut config = Self::default();
        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    fn expand_env_vars(&mut self) {
        self.apply_overrides(|name| env::var(name).ok());
    }

    /// Apply the well-known environment overrides through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(endpoint) = lookup("AZURE_AI_ENDPOINT") {
            self.provider.endpoint = Some(endpoint);
        }
        if let Some(deployment) = lookup("AZURE_AI_DEPLOYMENT") {
            self.agent.model = deployment;
        }
        if let Some(api_key) = lookup("AZURE_AI_API_KEY") {
            self.provider.api_key = Some(api_key);
        }
        if let Some(url) = lookup("MCP_SERVER_URL") {
            self.mcp.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.agent.model.is_empty() {
            return Err(LearnError::ConfigError("Model cannot be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(LearnError::ConfigError("Temperature must be between 0.0 and 2.0".into()));
        }
        if self.agent.max_iterations == 0 {
            return Err(LearnError::ConfigError("max_iterations must be at least 1".into()));
        }
        if !self.mcp.url.starts_with("http://") && !self.mcp.url.starts_with("https://") {
            return Err(LearnError::ConfigError(
                "MCP server URL must start with http:// or https://".into(),
            ));
        }
        Ok(())
    }

    /// Checks the settings only the selected completion provider needs.
    /// Commands that talk to the MCP server alone skip this.
    pub fn validate_provider(&self) -> Result<()> {
        match self.provider.kind {
            ProviderKind::OpenAi => {
                if self.provider.endpoint.as_deref().map_or(true, str::is_empty) {
                    return Err(LearnError::ConfigError(
                        "AZURE_AI_ENDPOINT environment variable or provider.endpoint is required".into(),
                    ));
                }
            }
            ProviderKind::Bedrock => {
                if self.provider.region.is_empty() {
                    return Err(LearnError::ConfigError("AWS region cannot be empty".into()));
                }
            }
        }
        Ok(())
    }

    pub fn default_config_path() -> PathBuf {
        let home_dir = env::var("HOME_DIR")
            .unwrap_or_else(|_| env::var("HOME").unwrap_or_else(|_| ".".to_string()));
        PathBuf::from(home_dir).join(".learn-agent").join("config.yaml")
    }
}

impl AgentSettings {
    pub fn get_system_prompt(&self) -> String {
        self.system_prompt
            .clone()
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            model: default_model(),
            system_prompt: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            endpoint: None,
            api_key: None,
            api_version: None,
            region: default_region(),
            profile: None,
        }
    }
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            url: default_mcp_url(),
            timeout_ms: default_timeout_ms(),
            protocol_version: default_protocol_version(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            headers: HashMap::new(),
        }
    }
}

fn default_agent_name() -> String { "learn-agent".to_string() }
fn default_model() -> String { "gpt-5.1".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> usize { 4096 }
fn default_max_iterations() -> usize { 25 }
fn default_region() -> String { "us-east-1".to_string() }
fn default_mcp_url() -> String { DEFAULT_MCP_URL.to_string() }
fn default_timeout_ms() -> u64 { 60_000 }
fn default_protocol_version() -> String { DEFAULT_PROTOCOL_VERSION.to_string() }
fn default_client_name() -> String { "learn-agent-mcp-client".to_string() }
fn default_client_version() -> String { env!("CARGO_PKG_VERSION").to_string() }
