mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::*;
use playground::server::{create_router, AppState};
use playground::{Credentials, OrchestratorOptions, ProviderRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(base_url: &str, credentials: Credentials) -> Router {
    let state = AppState::new(
        Arc::new(catalog(base_url)),
        Arc::new(ProviderRegistry::new(credentials)),
        OrchestratorOptions::default(),
    );
    create_router(state)
}

fn app(base_url: &str) -> Router {
    app_with(
        base_url,
        Credentials {
            nvidia_api_key: Some("nv-test".into()),
            openai_api_key: None,
        },
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, String) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn send_json(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, text) = send(app, method, uri, body).await;
    (status, serde_json::from_str(&text).unwrap())
}

async fn new_session(app: &Router) -> String {
    let (status, session) = send_json(app, "POST", "/api/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    session["id"].as_str().unwrap().to_string()
}

/// (event, data) pairs of an SSE body
fn sse_events(body: &str) -> Vec<(String, Value)> {
    body.split("\n\n")
        .filter_map(|block| {
            let mut event = None;
            let mut data = None;
            for line in block.lines() {
                if let Some(name) = line.strip_prefix("event:") {
                    event = Some(name.trim().to_string());
                } else if let Some(payload) = line.strip_prefix("data:") {
                    data = serde_json::from_str(payload.trim()).ok();
                }
            }
            Some((event?, data?))
        })
        .collect()
}

#[tokio::test]
async fn test_index_and_health() {
    let app = app("http://unused");

    let (status, page) = send(&app, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("GenAI Playground"));
    assert!(page.contains("New conversation"));

    let (status, health) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_list_models_in_catalog_order() {
    let app = app("http://unused");
    let (status, models) = send_json(&app, "GET", "/api/models", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(models[0]["name"], "deepseek-ai/deepseek-r1");
    assert_eq!(models[1]["name"], "local/unsupported");
    assert_eq!(models[0]["max_completion_tokens"], 4096);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = app("http://unused");

    let (_, session) = send_json(&app, "POST", "/api/sessions", None).await;
    let id = session["id"].as_str().unwrap();
    assert_eq!(session["settings"]["model"], "deepseek-ai/deepseek-r1");
    assert_eq!(session["settings"]["temperature"], json!(0.6));
    assert_eq!(session["transcript"]["turns"], json!([]));

    let (status, settings) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/settings", id),
        Some(json!({"temperature": 5.0, "max_completion_tokens": 100000})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["temperature"], json!(1.0));
    assert_eq!(settings["max_completion_tokens"], 4096);

    let (status, settings) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/settings", id),
        Some(json!({"model": "local/unsupported"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["model"], "local/unsupported");
    assert_eq!(settings["max_completion_tokens"], 512);

    let (status, error) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/settings", id),
        Some(json!({"model": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error["code"], "BAD_REQUEST");

    let (status, settings) = send_json(
        &app,
        "PUT",
        &format!("/api/sessions/{}/settings", id),
        Some(json!({"max_completion_tokens": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["max_completion_tokens"], 1);

    let (status, fetched) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["settings"]["model"], "local/unsupported");
}

#[tokio::test]
async fn test_delete_session() {
    let app = app("http://unused");
    let id = new_session(&app).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, _) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, error) = send_json(&app, "DELETE", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_unknown_session_is_404() {
    let app = app("http://unused");
    let missing = uuid::Uuid::new_v4();

    let (status, error) = send_json(&app, "GET", &format!("/api/sessions/{}", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error["error"], "NotFound");

    let (status, _) = send_json(&app, "POST", &format!("/api/sessions/{}/reset", missing), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_message_validation() {
    let app = app("http://unused");
    let id = new_session(&app).await;

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unsupported_provider_is_rejected() {
    let app = app("http://unused");
    let id = new_session(&app).await;
    send(
        &app,
        "PUT",
        &format!("/api/sessions/{}/settings", id),
        Some(json!({"model": "local/unsupported"})),
    )
    .await;

    let (status, error) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "Oi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["message"]
        .as_str()
        .unwrap()
        .contains("No model instance found for provider ollama"));

    // the rejected message never reached the transcript
    let (_, session) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(session["transcript"]["turns"], json!([]));
}

#[tokio::test]
async fn test_missing_credential_is_unavailable() {
    let app = app_with("http://unused", Credentials::default());
    let id = new_session(&app).await;

    let (status, error) = send_json(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "Oi"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(error["message"].as_str().unwrap().contains("NVIDIA_API_KEY"));
}

#[tokio::test]
async fn test_chat_turn_streams_and_records_transcript() {
    let mut provider = mockito::Server::new_async().await;
    let decision = provider
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer nv-test")
        .match_body(mockito::Matcher::PartialJson(json!({"stream": false})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(weather_call("call_1", "Lisbon").to_string())
        .create_async()
        .await;

    let answer_body = [
        r#"{"choices":[{"index":0,"delta":{"reasoning_content":"Use the tool output."}}]}"#,
        r#"{"choices":[{"index":0,"delta":{"content":"Está sol"}}]}"#,
        r#"{"choices":[{"index":0,"delta":{"content":" em Lisboa."}}]}"#,
        r#"{"choices":[],"usage":{"prompt_tokens":40,"completion_tokens":6,"total_tokens":46}}"#,
        "[DONE]",
    ]
    .iter()
    .map(|data| format!("data: {}\n\n", data))
    .collect::<String>();
    let answer = provider
        .mock("POST", "/chat/completions")
        .match_body(mockito::Matcher::PartialJson(json!({"stream": true})))
        .with_status(200)
        .with_header("content-type", "text/event-stream")
        .with_body(answer_body)
        .create_async()
        .await;

    let app = app(&provider.url());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "Como está o tempo em Lisboa?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let events = sse_events(&body);
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["step", "step", "step", "reasoning", "token", "token", "usage", "done"]
    );
    assert_eq!(events[0].1["node"], "tool_decider");
    assert_eq!(events[1].1["node"], "tool_executor");
    assert_eq!(events[4].1["text"], "Está sol");
    assert_eq!(events[6].1["total_tokens"], 46);

    let done = &events[7].1;
    assert_eq!(done["response"], "Está sol em Lisboa.");
    assert_eq!(done["reasoning"], "Use the tool output.");
    assert_eq!(done["tool_results"], json!(["The weather in Lisbon is sunny, 5°C."]));

    let (_, session) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    let turns = session["transcript"]["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["role"], "user");
    assert_eq!(turns[0]["content"], "Como está o tempo em Lisboa?");
    assert_eq!(turns[1]["role"], "assistant");
    assert_eq!(turns[1]["content"], "Está sol em Lisboa.");

    decision.assert_async().await;
    answer.assert_async().await;

    let (_, session) = send_json(&app, "POST", &format!("/api/sessions/{}/reset", id), None).await;
    assert_eq!(session["transcript"]["turns"], json!([]));
    assert_eq!(session["settings"]["model"], "deepseek-ai/deepseek-r1");
}

#[tokio::test]
async fn test_failed_turn_streams_error_and_leaves_no_trace() {
    let mut provider = mockito::Server::new_async().await;
    let rejected = provider
        .mock("POST", "/chat/completions")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"error": {
                "message": "context length exceeded",
                "type": "invalid_request_error",
                "param": null,
                "code": null
            }})
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let app = app(&provider.url());
    let id = new_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        &format!("/api/sessions/{}/messages", id),
        Some(json!({"content": "Oi"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let events = sse_events(&body);
    let names: Vec<&str> = events.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["step", "error"]);
    assert!(events[1].1["message"]
        .as_str()
        .unwrap()
        .contains("context length exceeded"));

    // the session is unlocked and the failed exchange was not recorded
    let (status, session) = send_json(&app, "GET", &format!("/api/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["transcript"]["turns"], json!([]));

    rejected.assert_async().await;
}
