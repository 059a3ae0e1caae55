mod chunk;
mod client;
mod tracing;

pub use chunk::{ChatChunk, Usage};
pub use client::{
    ChatChunkStream, ChatClient, ChatClientImpl, ChatCompletionCallOptions,
    ChatCompletionRequestOptions, DEFAULT_API_BASE,
};
pub use tracing::{LangSmithTracer, TracingError, TracingProvider, LANGSMITH_API_BASE};
