use learn_client::{build_provider, OpenAiProvider};
use learn_config::AgentConfig;
use learn_core::{CompletionProvider, LearnError, Message, ToolDefinition};
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> AgentConfig {
    let mut config = AgentConfig::default();
    config.provider.endpoint = Some(server.uri());
    config.provider.api_key = Some("test-key".to_string());
    config.agent.model = "gpt-4.1-mini".to_string();
    config
}

fn search_tool() -> ToolDefinition {
    ToolDefinition {
        name: "microsoft_docs_search".to_string(),
        description: "Search official Microsoft/Azure documentation".to_string(),
        parameters: json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        }),
    }
}

#[tokio::test]
async fn complete_sends_messages_tools_and_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("api-key", "test-key"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Use azure-storage-blob." } }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
    let messages = vec![Message::system("You are helpful"), Message::user("How do I upload a blob?")];
    let tools = vec![search_tool()];

    let completion = provider.complete(&messages, Some(&tools)).await.unwrap();

    assert_eq!(completion.content.as_deref(), Some("Use azure-storage-blob."));
    assert!(!completion.has_tool_invocations());

    let received = server.received_requests().await.unwrap();
    let body: Value = received[0].body_json().unwrap();
    assert_eq!(body["model"], "gpt-4.1-mini");
    assert_eq!(body["messages"][1]["content"], "How do I upload a blob?");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["parameters"]["required"][0], "query");
}

#[tokio::test]
async fn complete_returns_tool_invocations_with_raw_arguments() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": { "name": "microsoft_docs_search", "arguments": "{\"query\": \"blob python\"}" }
                    }]
                }
            }]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
    let completion = provider.complete(&[Message::user("q")], None).await.unwrap();

    assert_eq!(completion.content, None);
    let invocation = &completion.tool_invocations[0];
    assert_eq!(invocation.id, "call_1");
    assert_eq!(invocation.arguments, "{\"query\": \"blob python\"}");
}

#[tokio::test]
async fn api_version_is_sent_as_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(query_param("api-version", "2024-05-01-preview"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = config_for(&server);
    config.provider.api_version = Some("2024-05-01-preview".to_string());
    let provider = build_provider(&config).await.unwrap();

    let completion = provider.complete(&[Message::user("ping")], None).await.unwrap();
    assert_eq!(completion.content.as_deref(), Some("ok"));
}

#[tokio::test]
async fn endpoint_failure_is_a_completion_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(&config_for(&server)).unwrap();
    match provider.complete(&[Message::user("q")], None).await {
        Err(LearnError::Completion(message)) => assert!(message.contains("rate limited")),
        other => panic!("expected completion error, got {other:?}"),
    }
}

#[tokio::test]
async fn build_provider_requires_endpoint_for_openai() {
    let config = AgentConfig::default();
    assert!(matches!(
        build_provider(&config).await,
        Err(LearnError::ConfigError(_))
    ));
}

#[test]
fn missing_endpoint_is_a_config_error() {
    let config = AgentConfig::default();
    assert!(matches!(
        OpenAiProvider::new(&config),
        Err(LearnError::ConfigError(_))
    ));
}
