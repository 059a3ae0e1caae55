use super::error::{ApiError, ApiResult};
use super::routes::AppState;
use crate::catalog::ModelSpec;
use crate::orchestrator::Orchestrator;
use crate::session::{Session, SessionSettings, SettingsUpdate};
use crate::stream::{render_turn, TurnDelta, TurnEvent};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use playground_core::Message;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/models
pub async fn list_models(State(state): State<AppState>) -> Json<Vec<ModelSpec>> {
    Json(state.catalog.models().to_vec())
}

/// POST /api/sessions
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Session>) {
    let session = state.sessions.create(&state.catalog).await;
    let snapshot = session.lock().await.clone();
    (StatusCode::CREATED, Json(snapshot))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Session>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.touch();
    Ok(Json(session.clone()))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.sessions.remove(id).await?;
    tracing::info!(session = %id, "session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<SettingsUpdate>,
) -> ApiResult<Json<SessionSettings>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    let settings = session.update_settings(&state.catalog, update)?.clone();
    Ok(Json(settings))
}

/// POST /api/sessions/:id/reset
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Session>> {
    let session = state.sessions.get(id).await?;
    let mut session = session.lock().await;
    session.reset();
    tracing::info!(session = %id, "conversation reset");
    Ok(Json(session.clone()))
}

/// POST /api/sessions/:id/messages
///
/// Streams the reply as server-sent events: `step`, `token`, `reasoning`,
/// `usage`, then `done` with the full outcome or `error`. The session stays
/// locked until the stream ends, so turns on one session never interleave.
/// The exchange reaches the transcript only once the answer is complete.
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let content = request.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::BadRequest("message content must not be empty".into()));
    }

    let mut session = state.sessions.get(id).await?.lock_owned().await;

    let index = session.model_index(&state.catalog)?;
    let model = state
        .providers
        .get_model_instance(&state.catalog, index, session.settings.params())?
        .ok_or_else(|| {
            let provider = state
                .catalog
                .get(index)
                .map(|spec| spec.provider.clone())
                .unwrap_or_default();
            ApiError::BadRequest(format!("No model instance found for provider {}", provider))
        })?;
    let orchestrator = Orchestrator::new(model, state.options.clone())?;

    let mut messages = session.transcript.messages();
    messages.push(Message::human(content.clone()));
    let mut turn = render_turn(orchestrator.invoke(messages));
    tracing::info!(session = %id, model = %session.settings.model, "chat turn started");

    let events = async_stream::stream! {
        while let Some(event) = turn.next().await {
            match event {
                Ok(TurnEvent::Step(node)) => {
                    yield sse_event("step", json!({ "node": node }));
                }
                Ok(TurnEvent::Delta(TurnDelta::Token(text))) => {
                    yield sse_event("token", json!({ "text": text }));
                }
                Ok(TurnEvent::Delta(TurnDelta::Reasoning(text))) => {
                    yield sse_event("reasoning", json!({ "text": text }));
                }
                Ok(TurnEvent::Delta(TurnDelta::Usage(usage))) => {
                    yield sse_event("usage", usage);
                }
                Ok(TurnEvent::Finished(outcome)) => {
                    session.push_user(content.clone());
                    session.push_assistant(outcome.response.clone());
                    tracing::info!(session = %id, usage = ?outcome.usage, "chat turn finished");
                    yield sse_event("done", &outcome);
                }
                Err(err) => {
                    tracing::error!(session = %id, error = %err, "chat turn failed");
                    yield sse_event("error", json!({ "message": err.to_string() }));
                }
            }
        }
    };

    Ok(Sse::new(events.map(Ok)).keep_alive(KeepAlive::default()))
}

fn sse_event(name: &str, data: impl Serialize) -> Event {
    match Event::default().event(name).json_data(data) {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(event = name, error = %err, "failed to encode event");
            Event::default().event("error").data(err.to_string())
        }
    }
}
