#![allow(dead_code)]

use async_openai::types::{CreateChatCompletionRequest, CreateChatCompletionResponse};
use async_trait::async_trait;
use futures::stream;
use playground::{ChatModel, GenerationParams, ModelCatalog};
use playground_core::completion::{ChatChunkStream, ChatClient, ChatCompletionCallOptions};
use playground_core::{ChatChunk, CompletionError, Usage};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Chat client replaying canned replies: `complete` pops a decision,
/// `complete_stream` pops a list of chunks. Every request is recorded.
#[derive(Default)]
pub struct ScriptedClient {
    decisions: Mutex<VecDeque<Value>>,
    answers: Mutex<VecDeque<Vec<ChatChunk>>>,
    requests: Mutex<Vec<CreateChatCompletionRequest>>,
    latency: Option<Duration>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decide(self, response: Value) -> Self {
        self.decisions.lock().unwrap().push_back(response);
        self
    }

    pub fn answer(self, chunks: Vec<ChatChunk>) -> Self {
        self.answers.lock().unwrap().push_back(chunks);
        self
    }

    /// Delay every non-streamed completion by `latency`
    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Recorded requests as JSON, in call order
    pub fn requests(&self) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|request| serde_json::to_value(request).unwrap())
            .collect()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(
        &self,
        request: CreateChatCompletionRequest,
        _options: Option<ChatCompletionCallOptions>,
    ) -> Result<CreateChatCompletionResponse, CompletionError> {
        self.requests.lock().unwrap().push(request);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let response = self
            .decisions
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CompletionError::EmptyResponse)?;
        Ok(serde_json::from_value(response)?)
    }

    async fn complete_stream(
        &self,
        request: CreateChatCompletionRequest,
        _options: Option<ChatCompletionCallOptions>,
    ) -> Result<ChatChunkStream, CompletionError> {
        self.requests.lock().unwrap().push(request);
        let chunks = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(CompletionError::EmptyResponse)?;
        Ok(Box::pin(stream::iter(chunks.into_iter().map(Ok))))
    }
}

pub fn completion(message: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1700000000,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": message,
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
    })
}

/// Decider reply without tool calls
pub fn plain_reply(content: &str) -> Value {
    completion(json!({"role": "assistant", "content": content}))
}

/// Decider reply asking for the weather in `city`
pub fn weather_call(call_id: &str, city: &str) -> Value {
    completion(json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": call_id,
            "type": "function",
            "function": {
                "name": "get_weather",
                "arguments": json!({"city": city}).to_string()
            }
        }]
    }))
}

pub fn usage(prompt: u32, completion: u32) -> Usage {
    Usage {
        prompt_tokens: prompt,
        completion_tokens: completion,
        total_tokens: prompt + completion,
    }
}

pub fn params() -> GenerationParams {
    GenerationParams {
        temperature: 0.5,
        max_completion_tokens: 256,
    }
}

pub fn scripted_model(client: Arc<ScriptedClient>) -> ChatModel {
    ChatModel::new(client, "test-model", params())
}

pub fn catalog_json(base_url: &str) -> String {
    json!([
        {
            "name": "deepseek-ai/deepseek-r1",
            "provider": "nvidia",
            "base_url": base_url,
            "temperature_min": 0.0,
            "temperature_max": 1.0,
            "temperature_default": 0.6,
            "max_completion_tokens": 4096
        },
        {
            "name": "local/unsupported",
            "provider": "ollama",
            "base_url": base_url,
            "temperature_min": 0.0,
            "temperature_max": 2.0,
            "temperature_default": 1.0,
            "max_completion_tokens": 512
        }
    ])
    .to_string()
}

pub fn catalog(base_url: &str) -> ModelCatalog {
    ModelCatalog::from_json(&catalog_json(base_url)).unwrap()
}
