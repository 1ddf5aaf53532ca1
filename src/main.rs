use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use learn_agent::{Agent, ToolObserver};
use learn_client::{build_provider, display_tool_call, display_tool_result};
use learn_config::AgentConfig;
use learn_mcp::{McpClient, ToolDescriptor};
use serde_json::Value;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "learn-agent")]
#[command(about = "Ask questions answered from Microsoft Learn documentation", long_about = None)]
struct Cli {
    /// YAML config file (defaults to ~/.learn-agent/config.yaml when present)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive conversation mode (default)
    Chat,

    /// Answer a single question and exit
    Ask {
        #[arg(short, long)]
        prompt: String,
    },

    /// List the tools the MCP server offers
    Tools,

    /// Search Microsoft Learn documentation
    Search { query: String },

    /// Fetch a documentation page as markdown
    Fetch { url: String },

    /// Search official code samples
    Samples {
        query: String,

        #[arg(short, long)]
        language: Option<String>,
    },
}

/// Prints tool activity while a turn runs.
struct ConsoleObserver;

impl ToolObserver for ConsoleObserver {
    fn on_tool_call(&self, name: &str, arguments: &Value) {
        display_tool_call(name, arguments);
    }

    fn on_tool_result(&self, name: &str, text: &str) {
        display_tool_result(name, text);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let config = AgentConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    info!("Using MCP server {}", config.mcp.url);

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let mut agent = connect_agent(&config).await?;
            interactive_chat(&mut agent).await?;
            agent.close().await?;
        }
        Commands::Ask { prompt } => {
            let mut agent = connect_agent(&config).await?;
            let answer = agent.chat(&prompt).await;
            agent.close().await?;
            println!("{}", answer?);
        }
        Commands::Tools => {
            let mut client = connect_mcp(&config).await?;
            let tools = client.list_tools().await?;
            print_tools(&tools);
            client.close().await?;
        }
        Commands::Search { query } => {
            let mut client = connect_mcp(&config).await?;
            println!("{}", client.search_docs(&query).await?);
            client.close().await?;
        }
        Commands::Fetch { url } => {
            let mut client = connect_mcp(&config).await?;
            println!("{}", client.fetch_doc(&url).await?);
            client.close().await?;
        }
        Commands::Samples { query, language } => {
            let mut client = connect_mcp(&config).await?;
            println!("{}", client.search_code_samples(&query, language.as_deref()).await?);
            client.close().await?;
        }
    }

    Ok(())
}

async fn connect_agent(config: &AgentConfig) -> Result<Agent> {
    let provider = build_provider(config).await?;
    let agent = Agent::connect(config, provider)
        .await
        .with_context(|| format!("Failed to connect to MCP server at {}", config.mcp.url))?;
    Ok(agent.with_observer(ConsoleObserver))
}

async fn connect_mcp(config: &AgentConfig) -> Result<McpClient> {
    let mut client = McpClient::connect(&config.mcp)?;
    client
        .initialize()
        .await
        .with_context(|| format!("Failed to initialize MCP session with {}", config.mcp.url))?;
    Ok(client)
}

async fn interactive_chat(agent: &mut Agent) -> Result<()> {
    println!("📚 Microsoft Learn Agent");
    println!("Ask about Azure, .NET, Microsoft 365 and other Microsoft technologies.");
    println!("Type 'clear' to reset the conversation, 'exit' or 'quit' to leave.");
    println!("═══════════════════════════════════════");
    print_tools(agent.tools());

    loop {
        print!("\nYou> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            println!("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            agent.clear_conversation();
            println!("Conversation cleared.");
            continue;
        }

        let history_len = agent.conversation().len();
        match agent.chat(input).await {
            Ok(answer) => println!("\nAssistant> {answer}"),
            Err(e) => {
                // Keep the history consistent for the next turn
                agent.truncate(history_len);
                error!("Turn failed: {}", e);
                println!("\n❌ Error: {e}");
            }
        }
    }

    Ok(())
}

fn print_tools(tools: &[ToolDescriptor]) {
    println!("\n🛠️  Available Tools:");
    for tool in tools {
        let description = tool.description.as_deref().unwrap_or_default();
        let short: String = description.chars().take(60).collect();
        println!("  - {}: {}...", tool.name, short);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    Ok(())
}
