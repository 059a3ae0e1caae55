use super::handlers;
use crate::catalog::ModelCatalog;
use crate::orchestrator::OrchestratorOptions;
use crate::provider::ProviderRegistry;
use crate::session::SessionStore;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub catalog: Arc<ModelCatalog>,
    pub providers: Arc<ProviderRegistry>,
    pub sessions: SessionStore,
    pub options: OrchestratorOptions,
}

impl AppState {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        providers: Arc<ProviderRegistry>,
        options: OrchestratorOptions,
    ) -> Self {
        Self {
            catalog,
            providers,
            sessions: SessionStore::new(),
            options,
        }
    }
}

/// Build the complete router: UI page plus JSON and SSE API
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/models", get(handlers::list_models))
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/:id/settings", put(handlers::update_settings))
        .route("/api/sessions/:id/reset", post(handlers::reset_session))
        .route("/api/sessions/:id/messages", post(handlers::send_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
