use jarvis_llm::{LlmError, OllamaClient, DEFAULT_TEMPERATURE};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OllamaClient {
    OllamaClient::new(server.uri(), "llama3.1", Duration::from_secs(5)).expect("client")
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.1",
        "message": {"role": "assistant", "content": content},
        "done": true
    }))
}

#[tokio::test]
async fn ask_sends_json_mode_request_and_decodes_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.1",
            "format": "json",
            "stream": false,
            "messages": [
                {"role": "system", "content": "sys"},
                {"role": "user", "content": "Licht an"}
            ]
        })))
        .respond_with(reply(
            r#"{"tool_name": "ha_light_turn_on", "arguments": {"entity_id": "light.bad"}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let answer = client(&server)
        .ask("Licht an", "sys", DEFAULT_TEMPERATURE)
        .await
        .expect("ask should succeed");

    assert_eq!(answer["tool_name"], "ha_light_turn_on");
    assert_eq!(answer["arguments"]["entity_id"], "light.bad");
}

#[tokio::test]
async fn empty_content_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("  "))
        .mount(&server)
        .await;

    let err = client(&server).ask("x", "y", 0.1).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}

#[tokio::test]
async fn non_object_content_is_invalid_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("Sure! I will turn on the light."))
        .mount(&server)
        .await;

    let err = client(&server).ask("x", "y", 0.1).await.unwrap_err();
    assert_eq!(err.to_string(), "Ollama response was not valid JSON");
}

#[tokio::test]
async fn server_errors_are_request_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server).ask("x", "y", 0.1).await.unwrap_err();
    assert!(matches!(err, LlmError::Request(_)));
}
