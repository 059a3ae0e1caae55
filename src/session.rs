//! Per-user chat sessions: selected model, sampling settings and transcript.

use crate::catalog::{GenerationParams, ModelCatalog, ModelSpec};
use chrono::{DateTime, Utc};
use playground_core::Message;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(Uuid),

    #[error("Unknown model: {0}")]
    UnknownModel(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn to_message(&self) -> Message {
        match self.role {
            Role::User => Message::human(self.content.clone()),
            Role::Assistant => Message::ai(self.content.clone()),
        }
    }
}

/// Append-only list of turns
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The conversation as graph messages
    pub fn messages(&self) -> Vec<Message> {
        self.turns.iter().map(ChatTurn::to_message).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_completion_tokens: u32,
}

impl SessionSettings {
    pub fn from_spec(spec: &ModelSpec) -> Self {
        let params = spec.default_params();
        Self {
            model: spec.name.clone(),
            temperature: params.temperature,
            max_completion_tokens: params.max_completion_tokens,
        }
    }

    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_completion_tokens: self.max_completion_tokens,
        }
    }
}

/// Partial settings change; absent fields keep their value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsUpdate {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub settings: SessionSettings,
    pub transcript: Transcript,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    /// New session on the catalog's first model
    pub fn new(catalog: &ModelCatalog) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            settings: SessionSettings::from_spec(catalog.first()),
            transcript: Transcript::default(),
            created_at: now,
            last_active: now,
        }
    }

    /// Marks the session as in use
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Applies `update`, clamping values to the selected model's bounds.
    ///
    /// Switching model without giving values resets them to the new model's
    /// defaults.
    pub fn update_settings(
        &mut self,
        catalog: &ModelCatalog,
        update: SettingsUpdate,
    ) -> Result<&SessionSettings, SessionError> {
        let model_changed = update
            .model
            .as_ref()
            .is_some_and(|model| *model != self.settings.model);
        let model = update.model.unwrap_or_else(|| self.settings.model.clone());
        let spec = catalog
            .find(&model)
            .ok_or_else(|| SessionError::UnknownModel(model.clone()))?;

        let base = if model_changed {
            spec.default_params()
        } else {
            self.settings.params()
        };
        let params = spec.clamp(GenerationParams {
            temperature: update.temperature.unwrap_or(base.temperature),
            max_completion_tokens: update
                .max_completion_tokens
                .unwrap_or(base.max_completion_tokens),
        });

        self.settings = SessionSettings {
            model: spec.name.clone(),
            temperature: params.temperature,
            max_completion_tokens: params.max_completion_tokens,
        };
        self.touch();
        tracing::debug!(session = %self.id, settings = ?self.settings, "settings updated");
        Ok(&self.settings)
    }

    /// Catalog position of the selected model
    pub fn model_index(&self, catalog: &ModelCatalog) -> Result<usize, SessionError> {
        catalog
            .index_of(&self.settings.model)
            .ok_or_else(|| SessionError::UnknownModel(self.settings.model.clone()))
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatTurn::new(Role::User, content));
        self.touch();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.transcript.push(ChatTurn::new(Role::Assistant, content));
        self.touch();
    }

    /// Starts a new conversation; settings are kept
    pub fn reset(&mut self) {
        self.transcript = Transcript::default();
        self.touch();
    }
}

/// In-memory sessions, each behind its own lock
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, catalog: &ModelCatalog) -> Arc<Mutex<Session>> {
        let session = Session::new(catalog);
        let id = session.id;
        let session = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, session.clone());
        tracing::info!(session = %id, "session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionError::NotFound(id))
    }

    /// Drops sessions untouched for longer than `max_idle`. Sessions locked
    /// by a running turn are kept. Returns how many were dropped.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(max_idle)
            .ok()
            .and_then(|idle| Utc::now().checked_sub_signed(idle))
        else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| match session.try_lock() {
            Ok(session) if session.last_active < cutoff => {
                tracing::info!(session = %id, last_active = %session.last_active, "idle session evicted");
                false
            }
            _ => true,
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
