use super::context::Context;
use crate::graph::END;
use crate::node::Node;
use crate::tool::ToolRegistry;
use crate::types::{Message, MessagesState, NodeOutput, NodeResult, ToolCall};
use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result};

/// Route label [`tools_condition`] returns when tools must run.
pub const TOOLS: &str = "tools";

/// Routes to [`TOOLS`] when the last message is an AI message with tool
/// calls, and to [`END`] otherwise.
pub fn tools_condition<S: MessagesState>(state: &S) -> String {
    match state.last_message() {
        Some(message) if message.has_tool_calls() => TOOLS.to_string(),
        _ => END.to_string(),
    }
}

/// Executes every tool call of the last AI message.
///
/// Each call yields one tool message. Failures (unknown tool, bad arguments,
/// execution errors) are reported back to the model as tool messages with an
/// `error` status instead of failing the run.
pub struct ToolNode<S> {
    name: String,
    tools: ToolRegistry,
    _phantom: std::marker::PhantomData<fn() -> S>,
}

impl<S> Debug for ToolNode<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("ToolNode")
            .field("name", &self.name)
            .field("tools", &self.tools.names())
            .finish()
    }
}

impl<S: MessagesState> ToolNode<S> {
    pub fn new(name: impl Into<String>, tools: ToolRegistry) -> Self {
        Self {
            name: name.into(),
            tools,
            _phantom: std::marker::PhantomData,
        }
    }

    async fn run_call(&self, call: &ToolCall) -> Message {
        let outcome = match self.tools.get(&call.name) {
            Some(tool) => tool.call(&call.args).await,
            None => Err(crate::types::ToolError::UnknownTool(call.name.clone())),
        };

        match outcome {
            Ok(output) => {
                tracing::debug!(tool = %call.name, call_id = %call.id, "tool call succeeded");
                Message::tool(output, call.id.clone(), "success")
            }
            Err(err) => {
                tracing::warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                Message::tool(format!("Error: {}", err), call.id.clone(), "error")
            }
        }
    }
}

#[async_trait]
impl<S: MessagesState> Node<S> for ToolNode<S> {
    async fn process(&self, _ctx: &Context, state: S) -> NodeResult<S> {
        let calls = state
            .last_message()
            .filter(|message| message.has_tool_calls())
            .and_then(|message| message.tool_calls.clone())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(calls.len());
        for call in &calls {
            results.push(self.run_call(call).await);
        }

        Ok(NodeOutput::Updates(S::record_tool_messages(results)))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
