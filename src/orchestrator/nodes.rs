use super::state::ChatState;
use super::{FINAL_ANSWER, TOOL_DECIDER};
use crate::provider::ChatModel;
use crate::stream::TurnAccumulator;
use async_trait::async_trait;
use futures::StreamExt;
use playground_core::{
    Context, Message, MessageType, MessagesState, Node, NodeOutput, NodeResult, ToolRegistry,
};
use std::sync::Arc;

/// Asks the model, tools bound, whether any tool has to run first
#[derive(Debug)]
pub struct ToolDecider {
    model: Arc<ChatModel>,
    tools: ToolRegistry,
}

impl ToolDecider {
    pub fn new(model: Arc<ChatModel>, tools: ToolRegistry) -> Self {
        Self { model, tools }
    }
}

#[async_trait]
impl Node<ChatState> for ToolDecider {
    async fn process(&self, ctx: &Context, state: ChatState) -> NodeResult<ChatState> {
        let reply = self
            .model
            .invoke(ctx, &state.messages, Some(&self.tools))
            .await?;

        let calls = reply.tool_calls.as_ref().map_or(0, Vec::len);
        tracing::info!(model = %self.model.model(), tool_calls = calls, "tool decision made");

        Ok(NodeOutput::Updates(ChatState::append_messages(vec![reply])))
    }

    fn name(&self) -> &str {
        TOOL_DECIDER
    }
}

/// Streams the answer shown to the user
#[derive(Debug)]
pub struct FinalAnswer {
    model: Arc<ChatModel>,
    answer_language: String,
}

impl FinalAnswer {
    pub fn new(model: Arc<ChatModel>, answer_language: impl Into<String>) -> Self {
        Self {
            model,
            answer_language: answer_language.into(),
        }
    }

    /// Messages sent to the model for the final reply
    pub fn prompt(&self, state: &ChatState) -> Vec<Message> {
        if !state.has_tool_context() {
            return conversation(&state.messages);
        }

        let system = Message::system(format!(
            "Answer the user clearly. If a task was successful, confirm it. \
             You may use the following context if relevant:\n{}\n\
             Always answer in {}.",
            state.tool_context().join("\n"),
            self.answer_language
        ));
        let mut prompt = Vec::with_capacity(state.messages.len() + 1);
        prompt.push(system);
        prompt.extend(state.messages.iter().cloned());
        prompt
    }
}

/// The transcript without the decider's tool-free draft reply
fn conversation(messages: &[Message]) -> Vec<Message> {
    match messages.split_last() {
        Some((last, rest)) if last.message_type == MessageType::AI && !last.has_tool_calls() => {
            rest.to_vec()
        }
        _ => messages.to_vec(),
    }
}

#[async_trait]
impl Node<ChatState> for FinalAnswer {
    async fn process(&self, ctx: &Context, state: ChatState) -> NodeResult<ChatState> {
        let prompt = self.prompt(&state);
        let mut chunks = self.model.stream(ctx, &prompt).await?;

        let mut accumulator = TurnAccumulator::new();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            accumulator.push(&chunk);
            ctx.emit(chunk);
        }

        tracing::info!(
            model = %self.model.model(),
            chars = accumulator.response().len(),
            usage = ?accumulator.usage(),
            "final answer streamed"
        );
        Ok(NodeOutput::Updates(ChatState::append_messages(vec![
            accumulator.into_message(),
        ])))
    }

    fn name(&self) -> &str {
        FINAL_ANSWER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playground_core::ToolCall;
    use serde_json::json;

    #[test]
    fn test_conversation_drops_draft_reply() {
        let messages = vec![
            Message::human("Oi"),
            Message::ai("Olá!"),
            Message::human("Tudo bem?"),
            Message::ai("draft"),
        ];
        let trimmed = conversation(&messages);
        assert_eq!(trimmed.len(), 3);
        assert_eq!(trimmed.last().unwrap().content, "Tudo bem?");

        let pending = vec![Message::human("Oi")];
        assert_eq!(conversation(&pending), pending);
    }

    #[test]
    fn test_conversation_keeps_tool_request() {
        let messages = vec![
            Message::human("Weather?"),
            Message::ai("").with_tool_calls(vec![ToolCall::new(
                "call_1",
                "get_weather",
                json!({"city": "Lisbon"}),
            )]),
        ];
        assert_eq!(conversation(&messages).len(), 2);
    }
}
