use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use skiff::agent_loop::{AgentLoop, LoopState};
use skiff::config::{Protocol, SkiffConfig};
use skiff::error::SkiffError;
use skiff::models::LanguageModel;
use skiff::provider::openai::OpenAiProvider;
use skiff::provider::{create_provider, CompletionRequest, ModelProvider, ToolDefinition};
use skiff::types::{GenerationSettings, Turn};

fn chat_response(content: serde_json::Value, tool_calls: Option<serde_json::Value>) -> serde_json::Value {
    let mut message = json!({ "role": "assistant", "content": content });
    if let Some(calls) = tool_calls {
        message["tool_calls"] = calls;
    }
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
    })
}

fn request() -> CompletionRequest {
    CompletionRequest::new(
        vec![Turn::system("rules"), Turn::user("list files")],
        GenerationSettings::builder().max_tokens(1024).build(),
    )
}

#[tokio::test]
async fn ollama_posts_to_v1_chat_completions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "model": "qwen2.5:14b",
            "max_tokens": 1024,
            "stream": false,
            "messages": [
                { "role": "system", "content": "rules" },
                { "role": "user", "content": "list files" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(json!("hello"), None)))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::ollama("qwen2.5:14b".into(), server.uri()).unwrap();
    let completion = provider.complete(&request()).await.unwrap();

    assert_eq!(provider.provider_name(), "ollama");
    assert_eq!(completion.text, "hello");
    assert!(completion.tool_call.is_none());
    assert_eq!(completion.usage.total_tokens, 20);
}

#[tokio::test]
async fn ollama_sends_no_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(|req: &Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(400)
            } else {
                ResponseTemplate::new(200).set_body_json(chat_response(json!("ok"), None))
            }
        })
        .mount(&server)
        .await;

    let provider = OpenAiProvider::ollama("qwen2.5:14b".into(), server.uri()).unwrap();
    assert_eq!(provider.complete(&request()).await.unwrap().text, "ok");
}

#[tokio::test]
async fn openai_sends_bearer_and_tools() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "tools": [{ "type": "function", "function": { "name": "list_files" } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            serde_json::Value::Null,
            Some(json!([
                { "id": "call_1", "type": "function",
                  "function": { "name": "list_files", "arguments": "{}" } },
                { "id": "call_2", "type": "function",
                  "function": { "name": "read_file", "arguments": "{\"file_name\":\"a.py\"}" } }
            ])),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new("gpt-4o".into(), "sk-test".into(), Some(server.uri())).unwrap();
    let completion = provider
        .complete(&request().with_tools(vec![ToolDefinition {
            name: "list_files".into(),
            description: "Returns a list of files in the directory.".into(),
            parameters: json!({ "type": "object", "properties": {}, "required": [] }),
        }]))
        .await
        .unwrap();

    let call = completion.tool_call.unwrap();
    assert_eq!(call.id.as_deref(), Some("call_1"));
    assert_eq!(call.name, "list_files");
    assert_eq!(call.arguments, "{}");
    assert_eq!(completion.text, "");
}

#[tokio::test]
async fn error_statuses_map_to_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer bad"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer busy"))
        .respond_with(
            ResponseTemplate::new(429).set_body_json(json!({ "error": { "retry_after": 1.5 } })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer down"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let complete = |key: &'static str| {
        let uri = server.uri();
        async move {
            OpenAiProvider::new("gpt-4o".into(), key.into(), Some(uri))
                .unwrap()
                .complete(&request())
                .await
        }
    };

    assert!(matches!(complete("bad").await, Err(SkiffError::Authentication(_))));
    assert!(matches!(
        complete("busy").await,
        Err(SkiffError::RateLimited { retry_after_ms: Some(1500) })
    ));
    assert!(matches!(
        complete("down").await,
        Err(SkiffError::Api { status: 503, .. })
    ));
}

#[tokio::test]
async fn empty_choices_is_an_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::ollama("qwen2.5:14b".into(), server.uri()).unwrap();
    assert!(matches!(
        provider.complete(&request()).await,
        Err(SkiffError::Api { .. })
    ));
}

#[tokio::test]
async fn agent_runs_end_to_end_against_ollama() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.py"), "print('a')\n").unwrap();
    std::fs::write(dir.path().join("b.py"), "print('b')\n").unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            json!("I will list the files.\n```action\n{\"tool_name\": \"list_files\", \"args\": {}}\n```"),
            None,
        )))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
            json!("```action\n{\"tool_name\": \"terminate\", \"args\": {\"message\": \"Found 2 files: a.py, b.py\"}}\n```"),
            None,
        )))
        .mount(&server)
        .await;

    let mut config = SkiffConfig::default();
    config.set_base_url("ollama", server.uri());
    config.workdir = dir.path().to_path_buf();
    config.protocol = Protocol::Fenced;

    let report = AgentLoop::from_config(&config).unwrap().run("list files").await;

    assert_eq!(report.state, LoopState::TerminatedByTool);
    assert_eq!(report.summary.as_deref(), Some("Found 2 files: a.py, b.py"));
    assert_eq!(report.usage.total_tokens, 40);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    let second: serde_json::Value = received[1].body_json().unwrap();
    assert_eq!(second["messages"][3]["role"], "user");
    assert_eq!(second["messages"][3]["content"], r#"{"result":["a.py","b.py"]}"#);
}

#[tokio::test]
async fn unreachable_server_is_absorbed_by_the_loop() {
    let mut config = SkiffConfig::default();
    // Nothing listens on the discard port.
    config.set_base_url("ollama", "http://127.0.0.1:9".into());
    config.set_max_iterations(2).unwrap();

    let report = AgentLoop::from_config(&config).unwrap().run("anything").await;

    assert_eq!(report.state, LoopState::TerminatedByIterationLimit);
    assert_eq!(report.iterations, 2);
    assert!(report.conversation.history()[1].content().starts_with("Error: Network error"));
}

#[test]
fn factory_builds_each_provider() {
    let mut config = SkiffConfig::default();
    config.set_api_key("openai", "sk-test".into());
    config.set_base_url("openai-compatible", "http://localhost:8080/v1".into());

    for (selector, name) in [
        ("ollama:qwen2.5:14b", "ollama"),
        ("openai:gpt-4o", "openai"),
        ("openai-compatible:local-model", "openai-compatible"),
    ] {
        let model: LanguageModel = selector.parse().unwrap();
        let provider = create_provider(&model, &config).unwrap();
        assert_eq!(provider.provider_name(), name);
        assert_eq!(provider.model_id(), model.model_id());
    }
}
