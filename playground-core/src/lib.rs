//! Graph execution engine, chat completion client and tool plumbing for the
//! GenAI playground.

#![allow(unused_extern_crates)]
extern crate self as playground_core;

pub mod completion;
pub mod graph;
pub mod node;
pub mod tool;
pub mod types;

pub mod prelude {
    //! Convenient re-exports of commonly used types
    pub use crate::completion::{
        ChatChunk, ChatChunkStream, ChatClient, ChatClientImpl, ChatCompletionCallOptions,
        ChatCompletionRequestOptions, LangSmithTracer, TracingError, TracingProvider, Usage,
    };
    pub use crate::graph::{
        Built, Condition, Edge, Graph, GraphEvent, GraphEventStream, NodeEvent, NotBuilt, END,
        START,
    };
    pub use crate::node::{
        tools_condition, Context, FunctionNode, Node, NodeConfig, ToolNode, TOOLS,
    };
    pub use crate::tool::{Tool, ToolFunction, ToolRegistry};
    pub use crate::types::{
        CompletionError, GraphError, GraphResult, GraphState, Message, MessageType,
        MessagesState, NodeError, NodeOutput, NodeResult, ToolCall, ToolError,
    };
}

// Re-export main types
pub use prelude::*;
