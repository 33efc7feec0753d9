use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jarvis_server::config::Config;
use jarvis_server::{app, AppState};
use jarvis_types::EntityState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    ha: MockServer,
    ollama: MockServer,
}

async fn setup() -> TestApp {
    let ha = MockServer::start().await;
    let ollama = MockServer::start().await;

    let mut config = Config::default();
    config.home_assistant.url = ha.uri();
    config.home_assistant.token = "test-token".to_string();
    config.ollama.url = ollama.uri();
    config.ollama.model = "llama3.1".to_string();

    let state = Arc::new(AppState::from_config(config).expect("state"));
    state.discovery.ingest(vec![
        EntityState::new("light.wohnzimmer", "on").with_attribute("friendly_name", "Wohnzimmerlampe"),
        EntityState::new("light.bad", "off").with_attribute("friendly_name", "Deckenlampe Bad"),
        EntityState::new("switch.kaffee", "on").with_attribute("friendly_name", "Kaffeemaschine"),
        EntityState::new("cover.wohnzimmer", "open").with_attribute("friendly_name", "Rollo Wohnzimmer"),
        EntityState::new("sensor.bad_temperature", "21.5")
            .with_attribute("friendly_name", "Temperatur Bad"),
    ]);

    TestApp {
        router: app(Arc::clone(&state)),
        state,
        ha,
        ollama,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn ollama_reply(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "llama3.1",
        "message": {"role": "assistant", "content": content.to_string()},
        "done": true
    }))
}

#[tokio::test]
async fn health_check_returns_ok() {
    let test = setup().await;
    let (status, json) = send(&test.router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn process_uses_fast_path_for_known_device() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({"entity_id": "light.bad"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"entity_id": "light.bad", "state": "on"}])),
        )
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Mach das Licht im Bad an"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "direct");
    assert_eq!(json["service"], "light.turn_on");
    assert_eq!(json["entity_id"], "light.bad");
    assert_eq!(json["result"][0]["state"], "on");
    assert!(test.state.processor.context_block().contains("turn_on (light) -> light.bad"));
}

#[tokio::test]
async fn fast_path_ranks_by_device_words_not_the_routing_keyword() {
    let test = setup().await;
    test.state.discovery.ingest(vec![
        EntityState::new("light.licht_flur", "off").with_attribute("friendly_name", "Licht Flur"),
        EntityState::new("light.bad_spiegelschrank", "off")
            .with_attribute("friendly_name", "Spiegelschrank Bad"),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_partial_json(json!({"entity_id": "light.bad_spiegelschrank"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Schalte das Licht im Bad an"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "direct");
    assert_eq!(json["entity_id"], "light.bad_spiegelschrank");
}

#[tokio::test]
async fn climate_fast_path_sets_decimal_temperature() {
    let test = setup().await;
    test.state.discovery.ingest(vec![
        EntityState::new("climate.bad", "heat").with_attribute("friendly_name", "Heizung Bad"),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/services/climate/set_temperature"))
        .and(body_partial_json(json!({"entity_id": "climate.bad", "temperature": 21.5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Heizung im Bad auf 21,5 Grad"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "direct");
    assert_eq!(json["service"], "climate.set_temperature");
    assert_eq!(json["entity_id"], "climate.bad");
}

#[tokio::test]
async fn climate_without_temperature_goes_to_the_llm() {
    let test = setup().await;
    test.state.discovery.ingest(vec![
        EntityState::new("climate.bad", "heat").with_attribute("friendly_name", "Heizung Bad"),
    ]);
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(json!({
            "tool_name": "ha_climate_set_temperature",
            "arguments": {"entity_id": "climate.bad", "temperature": 23}
        })))
        .expect(1)
        .mount(&test.ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/services/climate/set_temperature"))
        .and(body_partial_json(json!({"entity_id": "climate.bad", "temperature": 23})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Heizung im Bad wärmer"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "llm");
    assert_eq!(json["service"], "climate.set_temperature");
}

#[tokio::test]
async fn process_passes_brightness_on_fast_path() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .and(body_partial_json(json!({"entity_id": "light.bad", "brightness_pct": 40})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, _) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Licht im Bad auf 40% an"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn process_falls_back_to_llm() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(json!({
            "tool_name": "ha_cover_open",
            "arguments": {"entity_id": "cover.wohnzimmer", "unexpected": true}
        })))
        .expect(1)
        .mount(&test.ollama)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/services/cover/open_cover"))
        .and(body_partial_json(json!({"entity_id": "cover.wohnzimmer"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Bitte mach es im Wohnzimmer heller"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["path"], "llm");
    assert_eq!(json["service"], "cover.open_cover");
    assert_eq!(json["entity_id"], "cover.wohnzimmer");
}

#[tokio::test]
async fn llm_without_tool_name_is_a_bad_request() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(json!({"arguments": {}})))
        .mount(&test.ollama)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Wie spät ist es?"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "LLM response missing tool_name");
}

#[tokio::test]
async fn llm_with_unknown_tool_is_a_bad_request() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ollama_reply(json!({"tool_name": "ha_self_destruct", "arguments": {}})))
        .mount(&test.ollama)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Wie spät ist es?"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("ha_self_destruct"));
}

#[tokio::test]
async fn process_rejects_empty_and_malformed_input() {
    let test = setup().await;

    let (status, json) = send(&test.router, post_json("/api/process", &json!({"text": "   "}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "text must not be empty");

    let (status, _) = send(&test.router, post_json("/api/process", &json!({"command": "x"}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let request = Request::builder()
        .method("POST")
        .uri("/api/process")
        .header("Content-Type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&test.router, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn home_assistant_failure_is_reported() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_on"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&test.ha)
        .await;

    let (status, json) = send(
        &test.router,
        post_json("/api/process", &json!({"text": "Mach das Licht im Bad an"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("service call"));
}

#[tokio::test]
async fn chat_completion_with_entities_uses_rules() {
    let test = setup().await;
    let body = json!({
        "model": "jarvis",
        "messages": [{"role": "user", "content": "Welche Lampen sind an?"}],
        "entities": [
            {"entity_id": "light.wohnzimmer", "state": "on", "name": "Wohnzimmerlampe", "attributes": {}},
            {"entity_id": "light.bad", "state": "off", "name": "Deckenlampe Bad", "attributes": {}}
        ]
    });

    let (status, json) = send(&test.router, post_json("/v1/chat/completions", &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["object"], "chat.completion");
    assert_eq!(
        json["choices"][0]["message"]["content"],
        "Diese Lichter sind eingeschaltet: Wohnzimmerlampe."
    );
}

#[tokio::test]
async fn chat_completion_without_entities_runs_the_command() {
    let test = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/services/light/turn_off"))
        .and(body_partial_json(json!({"entity_id": "light.bad"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&test.ha)
        .await;

    let body = json!({
        "model": "home-llm",
        "messages": [
            {"role": "system", "content": "Du bist Jarvis."},
            {"role": "user", "content": "Schalte das Licht im Bad aus"}
        ]
    });
    let (status, json) = send(&test.router, post_json("/v1/chat/completions", &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["model"], "home-llm");
    assert!(json["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(
        json["choices"][0]["message"]["content"],
        "Ich habe light.turn_off für light.bad ausgeführt."
    );
}

#[tokio::test]
async fn chat_completion_requires_messages() {
    let test = setup().await;
    let (status, json) = send(
        &test.router,
        post_json("/v1/chat/completions", &json!({"model": "jarvis", "messages": []})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "No messages provided");
}

#[tokio::test]
async fn models_and_functions_are_listed() {
    let test = setup().await;

    let (status, json) = send(&test.router, get("/v1/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["object"], "list");
    assert_eq!(json["data"][0]["id"], "jarvis");

    let (status, json) = send(&test.router, get("/v1/functions")).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|f| f["name"].as_str())
        .collect();
    assert!(names.contains(&"turn_on"));
    assert!(names.contains(&"set_temperature"));
}

#[tokio::test]
async fn entities_are_found_by_name_and_state() {
    let test = setup().await;

    let (status, json) = send(&test.router, get("/api/entities?name=Deckenlampe%20Bad")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["entity_id"], "light.bad");

    let (status, json) = send(&test.router, get("/api/entities?state=open")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["entity_id"], "cover.wohnzimmer");

    let (status, json) = send(&test.router, get("/api/entities")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("name or state"));
}

#[tokio::test]
async fn malformed_query_strings_answer_with_json_errors() {
    let test = setup().await;

    let (status, json) = send(&test.router, get("/api/entities?name=Bad&name=Flur")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("name"));

    let (status, json) = send(&test.router, get("/api/devices/on?domains=light&domains=switch")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn devices_on_filters_by_domain() {
    let test = setup().await;

    let (status, json) = send(&test.router, get("/api/devices/on")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["entity_id"].as_str())
        .collect();
    assert_eq!(ids, ["light.wohnzimmer", "switch.kaffee"]);

    let (_, json) = send(&test.router, get("/api/devices/on?domains=switch")).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["entity_id"], "switch.kaffee");
}

#[tokio::test]
async fn status_reports_reachability() {
    let test = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "API running."})))
        .mount(&test.ha)
        .await;

    let (status, json) = send(&test.router, get("/api/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["home_assistant"]["reachable"], true);
    assert_eq!(json["discovery"]["entities"], 4);
    assert_eq!(json["llm"]["model"], "llama3.1");
    assert_eq!(json["voice"]["enabled"], false);
    assert_eq!(json["voice"]["stt_addr"], "127.0.0.1:10300");
}

#[tokio::test]
async fn voice_routes_are_unavailable_when_disabled() {
    let test = setup().await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/voice/command")
        .body(Body::from(vec![0u8; 320]))
        .unwrap();
    let (status, json) = send(&test.router, request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "voice services are disabled");

    let (status, _) = send(
        &test.router,
        post_json("/api/voice/speak", &json!({"text": "Hallo"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
