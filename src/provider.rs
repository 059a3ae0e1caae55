use crate::catalog::{GenerationParams, ModelCatalog};
use async_openai::types::ChatCompletionToolChoiceOption;
use playground_core::completion::{
    ChatChunkStream, ChatClient, ChatClientImpl, ChatCompletionCallOptions,
    ChatCompletionRequestOptions, TracingProvider, Usage,
};
use playground_core::types::to_request_messages;
use playground_core::{CompletionError, Context, Message, ToolRegistry};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Model index {index} is out of range (catalog has {len} models)")]
    UnknownModelIndex { index: usize, len: usize },

    #[error("Missing credential for provider {provider}: set {env}")]
    MissingCredential { provider: Provider, env: &'static str },
}

/// Providers the playground knows how to reach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Nvidia,
    OpenAI,
}

impl Provider {
    /// Environment variable holding the provider's API key
    pub fn credential_env(&self) -> &'static str {
        match self {
            Provider::Nvidia => "NVIDIA_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Nvidia => "nvidia",
            Provider::OpenAI => "openai",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nvidia" => Ok(Provider::Nvidia),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(()),
        }
    }
}

/// API keys per provider
#[derive(Clone, Default)]
pub struct Credentials {
    pub nvidia_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("nvidia_api_key", &self.nvidia_api_key.as_ref().map(|_| "***"))
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Credentials {
    pub fn get(&self, provider: Provider) -> Option<&str> {
        let key = match provider {
            Provider::Nvidia => self.nvidia_api_key.as_deref(),
            Provider::OpenAI => self.openai_api_key.as_deref(),
        };
        key.filter(|key| !key.trim().is_empty())
    }
}

/// A chat client bound to one model and its generation settings
#[derive(Clone)]
pub struct ChatModel {
    client: Arc<dyn ChatClient>,
    model: String,
    params: GenerationParams,
}

impl fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatModel")
            .field("model", &self.model)
            .field("params", &self.params)
            .finish()
    }
}

impl ChatModel {
    pub fn new(client: Arc<dyn ChatClient>, model: impl Into<String>, params: GenerationParams) -> Self {
        Self {
            client,
            model: model.into(),
            params,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn params(&self) -> GenerationParams {
        self.params
    }

    pub fn request_options(&self) -> ChatCompletionRequestOptions {
        ChatCompletionRequestOptions {
            model: self.model.clone(),
            temperature: Some(self.params.temperature),
            max_completion_tokens: Some(self.params.max_completion_tokens),
            tools: None,
            tool_choice: None,
        }
    }

    /// Request options advertising `tools` to the model
    pub fn bind_tools(&self, tools: &ToolRegistry) -> ChatCompletionRequestOptions {
        let mut options = self.request_options();
        if !tools.is_empty() {
            options.tools = Some(tools.schemas());
            options.tool_choice = Some(ChatCompletionToolChoiceOption::Auto);
        }
        options
    }

    fn call_options(ctx: &Context) -> ChatCompletionCallOptions {
        ChatCompletionCallOptions::new(Some(ctx.trace_id.clone()), ctx.parent_trace_id.clone())
    }

    /// Single, non-streamed completion returned as an AI message
    pub async fn invoke(
        &self,
        ctx: &Context,
        messages: &[Message],
        tools: Option<&ToolRegistry>,
    ) -> Result<Message, CompletionError> {
        let options = match tools {
            Some(tools) => self.bind_tools(tools),
            None => self.request_options(),
        };
        let request = self
            .client
            .create_chat_completion_request(to_request_messages(messages)?, options)?;
        let response = self
            .client
            .complete(request, Some(Self::call_options(ctx)))
            .await?;

        let choice = response
            .choices
            .first()
            .ok_or(CompletionError::EmptyResponse)?;
        let mut message = Message::from_response(&choice.message);
        if let Some(usage) = &response.usage {
            message = message.with_additional("usage", serde_json::to_value(Usage::from(usage))?);
        }
        Ok(message)
    }

    /// Streamed completion without tools
    pub async fn stream(
        &self,
        ctx: &Context,
        messages: &[Message],
    ) -> Result<ChatChunkStream, CompletionError> {
        let request = self
            .client
            .create_chat_completion_stream_request(to_request_messages(messages)?, self.request_options())?;
        self.client
            .complete_stream(request, Some(Self::call_options(ctx)))
            .await
    }
}

/// Builds model clients from catalog entries
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    credentials: Credentials,
    tracer: Option<Arc<dyn TracingProvider>>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("credentials", &self.credentials)
            .field("tracing", &self.tracer.is_some())
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            tracer: None,
        }
    }

    pub fn with_tracer(mut self, tracer: Arc<dyn TracingProvider>) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Client for the catalog entry at `index` using `params`.
    ///
    /// Returns `Ok(None)` when the entry names a provider this build does not
    /// support. `params` are clamped to the entry's bounds.
    pub fn get_model_instance(
        &self,
        catalog: &ModelCatalog,
        index: usize,
        params: GenerationParams,
    ) -> Result<Option<ChatModel>, ProviderError> {
        let spec = catalog
            .get(index)
            .ok_or(ProviderError::UnknownModelIndex {
                index,
                len: catalog.len(),
            })?;

        let Ok(provider) = spec.provider.parse::<Provider>() else {
            tracing::warn!(
                model = %spec.name,
                provider = %spec.provider,
                "No model instance found for provider"
            );
            return Ok(None);
        };

        let api_key = self
            .credentials
            .get(provider)
            .ok_or(ProviderError::MissingCredential {
                provider,
                env: provider.credential_env(),
            })?;

        let mut client = ChatClientImpl::with_api_base(api_key.to_string(), spec.base_url.clone());
        if let Some(tracer) = &self.tracer {
            client = client.with_tracer(tracer.clone());
        }

        tracing::debug!(model = %spec.name, %provider, base_url = %spec.base_url, "created model instance");
        Ok(Some(ChatModel::new(
            Arc::new(client),
            spec.name.clone(),
            spec.clamp(params),
        )))
    }
}
