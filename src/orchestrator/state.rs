use playground_core::{Message, MessageType, MessagesState};
use playground_macros::State;

/// State threaded through one chat turn
#[derive(State, Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    #[update(append)]
    pub messages: Vec<Message>,
    #[update(append)]
    pub tool_results: Vec<String>,
}

impl ChatState {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            tool_results: Vec::new(),
        }
    }

    /// Outputs of the tools executed this turn, in call order
    pub fn tool_context(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|m| m.is_tool())
            .map(|m| m.content.as_str())
            .collect()
    }

    pub fn has_tool_context(&self) -> bool {
        self.messages.iter().any(Message::is_tool)
    }

    /// The reply appended by the last node, if it was an AI message
    pub fn final_answer(&self) -> Option<&Message> {
        self.messages
            .last()
            .filter(|m| m.message_type == MessageType::AI)
    }
}

impl MessagesState for ChatState {
    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn append_messages(messages: Vec<Message>) -> Vec<ChatStateUpdate> {
        vec![ChatStateUpdate::Messages(messages)]
    }

    fn record_tool_messages(messages: Vec<Message>) -> Vec<ChatStateUpdate> {
        let results = messages.iter().map(|m| m.content.clone()).collect();
        vec![
            ChatStateUpdate::Messages(messages),
            ChatStateUpdate::ToolResults(results),
        ]
    }
}
