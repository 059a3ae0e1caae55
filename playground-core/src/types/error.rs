use async_openai::error::OpenAIError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for tool operations
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ToolError {
    #[error("Execution: {0}")]
    Execution(String),

    #[error("Serialization: {0}")]
    Serialization(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        ToolError::Serialization(err.to_string())
    }
}

/// Error type for chat completion calls
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Request: {0}")]
    Request(#[from] OpenAIError),

    #[error("Http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Stream: {0}")]
    Stream(String),

    #[error("Decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Error type for node operations
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NodeError {
    #[error("Node execution: {0}")]
    Execution(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Model: {0}")]
    ModelError(String),

    #[error("Subgraph execution: {0}")]
    SubgraphExecution(String),
}

impl From<CompletionError> for NodeError {
    fn from(err: CompletionError) -> Self {
        NodeError::ModelError(err.to_string())
    }
}

/// Error type for overall graph operations
#[derive(Error, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GraphError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Execution: {0}")]
    ExecutionError(String),

    #[error("Recursion limit of {0} steps reached without hitting END")]
    RecursionLimit(usize),

    // NodeError can bubble up automatically
    #[error(transparent)]
    Node(#[from] NodeError),
}
