//! Turns the raw graph event stream into what a chat front-end renders.

use crate::orchestrator::{ChatState, FINAL_ANSWER};
use futures::{Stream, StreamExt};
use playground_core::{ChatChunk, GraphError, GraphEvent, GraphEventStream, Message, NodeEvent, Usage};
use serde::Serialize;
use serde_json::json;
use std::pin::Pin;

/// Additional-data key holding a reply's reasoning trace
pub const REASONING_KEY: &str = "reasoning_content";
/// Additional-data key holding a reply's token usage
pub const USAGE_KEY: &str = "usage";

/// One renderable piece of a streamed reply
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TurnDelta {
    Token(String),
    Reasoning(String),
    Usage(Usage),
}

/// Folds streamed chunks into the full reply.
///
/// Tokens and reasoning are concatenated in arrival order; only the last
/// usage report is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnAccumulator {
    response: String,
    reasoning: String,
    usage: Option<Usage>,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `chunk` and returns the deltas to render for it
    pub fn push(&mut self, chunk: &ChatChunk) -> Vec<TurnDelta> {
        let mut deltas = Vec::new();
        if let Some(reasoning) = chunk.reasoning.as_deref().filter(|r| !r.is_empty()) {
            self.reasoning.push_str(reasoning);
            deltas.push(TurnDelta::Reasoning(reasoning.to_string()));
        }
        if let Some(content) = chunk.content.as_deref().filter(|c| !c.is_empty()) {
            self.response.push_str(content);
            deltas.push(TurnDelta::Token(content.to_string()));
        }
        if let Some(usage) = chunk.usage {
            self.usage = Some(usage);
            deltas.push(TurnDelta::Usage(usage));
        }
        deltas
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn usage(&self) -> Option<Usage> {
        self.usage
    }

    /// The accumulated reply as an AI message, reasoning and usage attached
    pub fn into_message(self) -> Message {
        let mut message = Message::ai(self.response);
        if !self.reasoning.is_empty() {
            message = message.with_additional(REASONING_KEY, json!(self.reasoning));
        }
        if let Some(usage) = self.usage {
            message = message.with_additional(USAGE_KEY, json!(usage));
        }
        message
    }
}

/// Everything known about a reply once its turn completes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    pub tool_results: Vec<String>,
}

impl TurnOutcome {
    fn new(accumulator: TurnAccumulator, state: &ChatState) -> Self {
        // Fall back to the final state when the answer was not streamed
        let answer = state.final_answer();
        let response = if accumulator.response.is_empty() {
            answer.map(|m| m.content.clone()).unwrap_or_default()
        } else {
            accumulator.response
        };
        let reasoning = if accumulator.reasoning.is_empty() {
            answer
                .and_then(|m| m.additional_value(REASONING_KEY))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        } else {
            Some(accumulator.reasoning)
        };
        let usage = accumulator.usage.or_else(|| {
            answer
                .and_then(|m| m.additional_value(USAGE_KEY))
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        });

        Self {
            response,
            reasoning,
            usage,
            tool_results: state.tool_results.clone(),
        }
    }
}

/// What a front-end renders while a turn runs
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// The graph entered a node
    Step(String),
    Delta(TurnDelta),
    Finished(TurnOutcome),
}

pub type TurnStream = Pin<Box<dyn Stream<Item = Result<TurnEvent, GraphError>> + Send>>;

/// Maps graph events to turn events. Only chunks from the final answer node
/// are rendered; the stream ends after `Finished` or the first error.
pub fn render_turn(mut events: GraphEventStream<ChatState>) -> TurnStream {
    Box::pin(async_stream::stream! {
        let mut accumulator = TurnAccumulator::new();
        while let Some(event) = events.next().await {
            match event {
                Ok(GraphEvent::Node(NodeEvent::Started { node })) => {
                    yield Ok(TurnEvent::Step(node));
                }
                Ok(GraphEvent::Node(NodeEvent::Chunk { node, chunk })) if node == FINAL_ANSWER => {
                    for delta in accumulator.push(&chunk) {
                        yield Ok(TurnEvent::Delta(delta));
                    }
                }
                Ok(GraphEvent::Node(_)) => {}
                Ok(GraphEvent::Completed(state)) => {
                    let outcome = TurnOutcome::new(std::mem::take(&mut accumulator), &state);
                    yield Ok(TurnEvent::Finished(outcome));
                    break;
                }
                Err(err) => {
                    yield Err(err);
                    break;
                }
            }
        }
    })
}
