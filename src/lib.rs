//! GenAI playground: pick a model, tune it, and chat with it through a
//! small tool-calling graph, in the browser or in the terminal.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod provider;
pub mod server;
pub mod session;
pub mod stream;
pub mod telemetry;
pub mod tools;

pub use catalog::{CatalogError, GenerationParams, ModelCatalog, ModelSpec};
pub use orchestrator::{ChatState, Orchestrator, OrchestratorOptions};
pub use provider::{ChatModel, Credentials, Provider, ProviderError, ProviderRegistry};
pub use session::{Session, SessionError, SessionSettings, SessionStore, SettingsUpdate};
pub use stream::{render_turn, TurnAccumulator, TurnDelta, TurnEvent, TurnOutcome};
