//! Command-line flags, each mirrored by an environment variable.

use crate::orchestrator::{OrchestratorOptions, DEFAULT_ANSWER_LANGUAGE};
use crate::provider::{Credentials, ProviderRegistry};
use clap::{Args, Parser, Subcommand};
use playground_core::completion::LANGSMITH_API_BASE;
use playground_core::LangSmithTracer;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// GenAI playground: chat with LLMs through a tool-calling graph
#[derive(Parser, Debug)]
#[command(name = "playground", version, about, long_about = None)]
pub struct Cli {
    /// Model catalog file
    #[arg(long, env = "PLAYGROUND_CATALOG", default_value = "models.json", global = true)]
    pub catalog: PathBuf,

    /// Language final answers are written in
    #[arg(long, env = "PLAYGROUND_ANSWER_LANGUAGE", default_value = DEFAULT_ANSWER_LANGUAGE, global = true)]
    pub answer_language: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct CredentialArgs {
    #[arg(long, env = "NVIDIA_API_KEY", hide_env_values = true, global = true)]
    pub nvidia_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Enables run tracing when set
    #[arg(long, env = "LANGSMITH_API_KEY", hide_env_values = true, global = true)]
    pub langsmith_api_key: Option<String>,

    #[arg(long, env = "LANGSMITH_ENDPOINT", default_value = LANGSMITH_API_BASE, global = true)]
    pub langsmith_endpoint: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the browser UI and its API
    Serve {
        #[arg(long, env = "PLAYGROUND_HOST", default_value = "127.0.0.1")]
        host: IpAddr,

        #[arg(long, env = "PLAYGROUND_PORT", default_value_t = 8501)]
        port: u16,

        /// Seconds of inactivity before a session is dropped; 0 keeps sessions forever
        #[arg(long, env = "PLAYGROUND_SESSION_TTL", default_value_t = 3600)]
        session_ttl: u64,
    },
    /// Chat in the terminal
    Chat {
        /// Catalog model name; defaults to the first entry
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        temperature: Option<f32>,

        #[arg(long)]
        max_tokens: Option<u32>,
    },
    /// List the catalog's models
    Models,
}

impl Cli {
    pub fn orchestrator_options(&self) -> OrchestratorOptions {
        OrchestratorOptions {
            answer_language: self.answer_language.clone(),
            ..OrchestratorOptions::default()
        }
    }
}

impl CredentialArgs {
    pub fn provider_registry(&self) -> ProviderRegistry {
        let registry = ProviderRegistry::new(Credentials {
            nvidia_api_key: self.nvidia_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
        });
        match self.langsmith_api_key.as_deref().filter(|key| !key.is_empty()) {
            Some(key) => {
                tracing::info!(endpoint = %self.langsmith_endpoint, "LangSmith tracing enabled");
                let tracer =
                    LangSmithTracer::new(key.to_string()).with_base_url(&self.langsmith_endpoint);
                registry.with_tracer(Arc::new(tracer))
            }
            None => registry,
        }
    }
}
