mod harness;

use std::sync::Arc;

use harness::mock_ollama::MockOllama;
use harness::mock_openai::{MockOpenAi, Reply};
use parley_chat::{Chat, ChatBackend, ChatError, ChatOptions, Message, ModelSource, OllamaRuntime};
use parley_config::Config;
use tokio_util::sync::CancellationToken;

fn load(toml: &str) -> Config {
    Config::from_toml(toml).unwrap()
}

#[tokio::test]
async fn remote_source_routes_to_provider() {
    let remote = MockOpenAi::start(Reply::completion("from remote")).await.unwrap();
    let local = MockOllama::builder().installed("llama3:latest").start().await.unwrap();

    let config = load(&format!(
        r#"
        [chat]
        source = "REMOTE"
        base_url = "{}"
        model_name = "gpt-4o-mini"
        model_id = "assistant-1"

        [local]
        base_url = "{}"
        "#,
        remote.base_url(),
        local.base_url()
    ));

    let runtime = Arc::new(OllamaRuntime::new(&config.local));
    let backend = ChatBackend::new(&config.chat, runtime).unwrap();
    assert_eq!(backend.source(), ModelSource::Remote);
    assert_eq!(backend.model_id(), "assistant-1");

    let response = backend
        .chat(&[Message::user("hi")], &ChatOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(response.content, "from remote");
    assert!(local.chat_requests().is_empty());
    assert_eq!(remote.last_authorization(), None);
}

#[tokio::test]
async fn local_source_routes_to_runtime() {
    let local = MockOllama::builder()
        .installed("llama3:latest")
        .reply("from local")
        .start()
        .await
        .unwrap();

    let config = load(&format!(
        r#"
        [chat]
        source = "local"
        model_name = "llama3"

        [local]
        base_url = "{}"
        "#,
        local.base_url()
    ));

    let runtime = Arc::new(OllamaRuntime::new(&config.local));
    let backend = ChatBackend::new(&config.chat, runtime).unwrap();
    assert_eq!(backend.source(), ModelSource::Local);

    let mut stream = backend
        .chat_stream(&[Message::user("hi")], &ChatOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    let mut text = String::new();
    while let Some(event) = stream.recv().await {
        text.push_str(&event.content);
    }
    assert_eq!(text, "from local");
    assert_eq!(local.chat_requests().len(), 1);
}

#[test]
fn unknown_source_fails_construction() {
    let config = load(
        r#"
        [chat]
        source = "edge"
        model_name = "llama3"
        "#,
    );

    let runtime = Arc::new(OllamaRuntime::new(&config.local));
    let err = ChatBackend::new(&config.chat, runtime).err().unwrap();
    assert!(matches!(err, ChatError::UnsupportedSource { ref value } if value == "edge"));
}
