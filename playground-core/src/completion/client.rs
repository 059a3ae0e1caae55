use super::chunk::{parse_stream_data, ChatChunk};
use super::tracing::TracingProvider;
use crate::types::CompletionError;
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionStreamOptions, ChatCompletionTool,
        ChatCompletionToolChoiceOption, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
    Client as OpenAIClient,
};
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde_json::json;
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;
use uuid::Uuid;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TEMPERATURE: f32 = 0.0;
const STREAM_DONE: &str = "[DONE]";

#[derive(Debug, Clone)]
pub struct ChatCompletionRequestOptions {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_completion_tokens: Option<u32>,
    pub tools: Option<Vec<ChatCompletionTool>>,
    pub tool_choice: Option<ChatCompletionToolChoiceOption>,
}

impl Default for ChatCompletionRequestOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE.into(),
            max_completion_tokens: None,
            tools: None,
            tool_choice: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatCompletionCallOptions {
    pub trace_id: Option<String>,
    pub parent_trace_id: Option<String>,
}

impl ChatCompletionCallOptions {
    pub fn new(trace_id: Option<String>, parent_trace_id: Option<String>) -> Self {
        Self {
            trace_id,
            parent_trace_id,
        }
    }
}

pub type ChatChunkStream = Pin<Box<dyn Stream<Item = Result<ChatChunk, CompletionError>> + Send>>;

// Base function to create request builder with common options
fn create_base_request(
    messages: Vec<ChatCompletionRequestMessage>,
    options: ChatCompletionRequestOptions,
) -> CreateChatCompletionRequestArgs {
    let mut builder = CreateChatCompletionRequestArgs::default();
    builder.model(options.model).messages(messages);
    if let Some(temperature) = options.temperature {
        builder.temperature(temperature);
    }
    if let Some(max_tokens) = options.max_completion_tokens {
        builder.max_tokens(max_tokens);
    }
    if let Some(tools) = options.tools {
        builder.tools(tools);
    }
    if let Some(tool_choice) = options.tool_choice {
        builder.tool_choice(tool_choice);
    }
    builder
}

#[async_trait]
pub trait ChatClient: Send + Sync {
    // Request creation methods
    fn create_chat_completion_request(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        options: ChatCompletionRequestOptions,
    ) -> Result<CreateChatCompletionRequest, CompletionError> {
        Ok(create_base_request(messages, options).stream(false).build()?)
    }

    fn create_chat_completion_stream_request(
        &self,
        messages: Vec<ChatCompletionRequestMessage>,
        options: ChatCompletionRequestOptions,
    ) -> Result<CreateChatCompletionRequest, CompletionError> {
        Ok(create_base_request(messages, options)
            .stream(true)
            .stream_options(ChatCompletionStreamOptions {
                include_usage: true,
            })
            .build()?)
    }

    // Completion methods
    async fn complete(
        &self,
        request: CreateChatCompletionRequest,
        options: Option<ChatCompletionCallOptions>,
    ) -> Result<CreateChatCompletionResponse, CompletionError>;

    async fn complete_stream(
        &self,
        request: CreateChatCompletionRequest,
        options: Option<ChatCompletionCallOptions>,
    ) -> Result<ChatChunkStream, CompletionError>;
}

/// Client for OpenAI-compatible chat completion endpoints.
///
/// Plain completions go through `async-openai`. Streams are read directly
/// as server-sent events so provider extensions such as
/// `reasoning_content` survive.
pub struct ChatClientImpl {
    client: OpenAIClient<OpenAIConfig>,
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    tracer: Option<Arc<dyn TracingProvider>>,
}

impl ChatClientImpl {
    pub fn new(api_key: String) -> Self {
        Self::with_api_base(api_key, DEFAULT_API_BASE)
    }

    pub fn with_api_base(api_key: String, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        let config = OpenAIConfig::new()
            .with_api_key(api_key.clone())
            .with_api_base(api_base.clone());
        Self {
            client: OpenAIClient::with_config(config),
            http: reqwest::Client::new(),
            api_base,
            api_key,
            tracer: None,
        }
    }

    pub fn with_tracer(self, tracer: Arc<dyn TracingProvider>) -> Self {
        Self {
            tracer: Some(tracer),
            ..self
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn trace_ids(options: Option<&ChatCompletionCallOptions>) -> (String, Option<String>) {
        let trace_id = options
            .and_then(|o| o.trace_id.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let parent_trace_id = options.and_then(|o| o.parent_trace_id.clone());
        (trace_id, parent_trace_id)
    }

    async fn start_trace(
        &self,
        trace_id: &str,
        name: &str,
        request: &CreateChatCompletionRequest,
        parent_trace_id: Option<String>,
    ) {
        if let Some(tracer) = &self.tracer {
            let inputs = serde_json::to_value(request)
                .unwrap_or_else(|_| json!({ "error": "Failed to serialize request" }));
            if let Err(e) = tracer
                .start_trace(trace_id, name, "llm", &inputs, parent_trace_id, Some(SystemTime::now()))
                .await
            {
                tracing::warn!(error = %e, "failed to start trace");
            }
        }
    }
}

async fn end_trace(tracer: Option<&Arc<dyn TracingProvider>>, trace_id: &str, outputs: serde_json::Value) {
    if let Some(tracer) = tracer {
        if let Err(e) = tracer
            .end_trace(trace_id, &outputs, Some(SystemTime::now()))
            .await
        {
            tracing::warn!(error = %e, "failed to end trace");
        }
    }
}

#[async_trait]
impl ChatClient for ChatClientImpl {
    async fn complete(
        &self,
        request: CreateChatCompletionRequest,
        options: Option<ChatCompletionCallOptions>,
    ) -> Result<CreateChatCompletionResponse, CompletionError> {
        let (trace_id, parent_trace_id) = Self::trace_ids(options.as_ref());
        self.start_trace(&trace_id, "chat_completion", &request, parent_trace_id)
            .await;

        tracing::debug!(model = %request.model, "sending chat completion");
        let response = self.client.chat().create(request).await?;

        let outputs = serde_json::to_value(&response)
            .unwrap_or_else(|_| json!({ "error": "Failed to serialize response" }));
        end_trace(self.tracer.as_ref(), &trace_id, outputs).await;

        Ok(response)
    }

    async fn complete_stream(
        &self,
        request: CreateChatCompletionRequest,
        options: Option<ChatCompletionCallOptions>,
    ) -> Result<ChatChunkStream, CompletionError> {
        let (trace_id, parent_trace_id) = Self::trace_ids(options.as_ref());
        self.start_trace(&trace_id, "chat_completion_stream", &request, parent_trace_id)
            .await;

        tracing::debug!(model = %request.model, "opening chat completion stream");
        let response = self
            .http
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "No response body".to_string());
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut events = response.bytes_stream().eventsource();
        let tracer = self.tracer.clone();

        let stream = async_stream::stream! {
            let mut full_response = String::new();
            while let Some(event) = events.next().await {
                match event {
                    Ok(event) => {
                        if event.data.trim() == STREAM_DONE {
                            break;
                        }
                        match parse_stream_data(&event.data) {
                            Ok(chunk) => {
                                if let Some(content) = &chunk.content {
                                    full_response.push_str(content);
                                }
                                if !chunk.is_empty() {
                                    yield Ok(chunk);
                                }
                            }
                            Err(e) => {
                                yield Err(CompletionError::Decode(e));
                                break;
                            }
                        }
                    }
                    Err(e) => {
                        yield Err(CompletionError::Stream(e.to_string()));
                        break;
                    }
                }
            }

            // End trace after we finish streaming
            end_trace(tracer.as_ref(), &trace_id, json!({ "streamed_content": full_response })).await;
        };

        Ok(Box::pin(stream))
    }
}
