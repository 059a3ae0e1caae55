//! The fixed chat flow: decide on tools, run them, answer.
//!
//! ```text
//! tool_decider --(tool calls)--> tool_executor --> final_answer --> END
//!              \--(no tool calls)---------------> final_answer --> END
//! ```

mod nodes;
mod state;

pub use nodes::{FinalAnswer, ToolDecider};
pub use state::{ChatState, ChatStateUpdate};

use crate::provider::ChatModel;
use crate::tools::default_tools;
use playground_core::{
    tools_condition, Built, Context, Graph, GraphEventStream, GraphResult, Message, NodeConfig,
    ToolNode, ToolRegistry, END, START, TOOLS,
};
use std::sync::Arc;

pub const TOOL_DECIDER: &str = "tool_decider";
pub const TOOL_EXECUTOR: &str = "tool_executor";
pub const FINAL_ANSWER: &str = "final_answer";

pub const DEFAULT_ANSWER_LANGUAGE: &str = "Portuguese";

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Language the final answer is written in when tools ran
    pub answer_language: String,
    /// Timeout for each node of the turn, in seconds
    pub node_timeout: u64,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            answer_language: DEFAULT_ANSWER_LANGUAGE.to_string(),
            node_timeout: 300,
        }
    }
}

/// Runs chat turns for one model through the tool-calling graph
#[derive(Debug, Clone)]
pub struct Orchestrator {
    model: Arc<ChatModel>,
    graph: Arc<Graph<ChatState, Built>>,
}

impl Orchestrator {
    pub fn new(model: ChatModel, options: OrchestratorOptions) -> GraphResult<Self> {
        Self::with_tools(model, default_tools(), options)
    }

    pub fn with_tools(
        model: ChatModel,
        tools: ToolRegistry,
        options: OrchestratorOptions,
    ) -> GraphResult<Self> {
        let model = Arc::new(model);
        // Provider calls run exactly once per turn
        let single_attempt = NodeConfig::builder()
            .max_retries(1)
            .timeout(options.node_timeout)
            .build();

        let mut graph = Graph::new("chat");
        graph
            .add_node(ToolDecider::new(model.clone(), tools.clone()))
            .add_node(ToolNode::<ChatState>::new(TOOL_EXECUTOR, tools))
            .add_node(FinalAnswer::new(model.clone(), options.answer_language))
            .add_edge(START, TOOL_DECIDER)
            .add_conditional_edges(
                TOOL_DECIDER,
                tools_condition::<ChatState>,
                [(TOOLS, TOOL_EXECUTOR), (END, FINAL_ANSWER)],
            )
            .add_edge(TOOL_EXECUTOR, FINAL_ANSWER)
            .add_edge(FINAL_ANSWER, END);
        for node in [TOOL_DECIDER, TOOL_EXECUTOR, FINAL_ANSWER] {
            graph.configure_node(node, single_attempt.clone());
        }

        Ok(Self {
            model,
            graph: Arc::new(graph.build()?),
        })
    }

    pub fn model(&self) -> &ChatModel {
        &self.model
    }

    /// Streams one turn over `messages`, the conversation so far ending with
    /// the user's new message
    pub fn invoke(&self, messages: Vec<Message>) -> GraphEventStream<ChatState> {
        tracing::debug!(model = %self.model.model(), messages = messages.len(), "starting chat turn");
        self.graph
            .clone()
            .stream(Context::default(), ChatState::new(messages))
    }

    /// Runs one turn to completion without streaming
    pub async fn run(&self, messages: Vec<Message>) -> GraphResult<ChatState> {
        self.graph
            .run(&Context::default(), ChatState::new(messages))
            .await
    }
}
