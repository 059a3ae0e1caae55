use std::fmt::Debug;

/// State threaded through a graph run.
///
/// Nodes either hand back a whole new state or a list of typed updates that
/// the graph folds in with [`GraphState::apply`]. `#[derive(State)]` from
/// `playground-macros` generates both the update enum and this impl.
pub trait GraphState: Clone + Debug + Send + Sync + 'static {
    type Update: Debug + Send;

    /// Update this state with a single update.
    fn apply(&mut self, update: Self::Update);

    /// Apply multiple updates in sequence.
    fn apply_many<I: IntoIterator<Item = Self::Update>>(&mut self, updates: I) {
        for update in updates {
            self.apply(update);
        }
    }
}

/// A graph state built around a conversation.
///
/// Lets prebuilt nodes such as [`crate::node::ToolNode`] read the message
/// list and append to it without knowing the concrete state type.
pub trait MessagesState: GraphState {
    fn messages(&self) -> &[crate::types::Message];

    /// Updates that append `messages` to the conversation.
    fn append_messages(messages: Vec<crate::types::Message>) -> Vec<Self::Update>;

    /// Updates recording the outputs of executed tools. Defaults to appending
    /// them as regular messages.
    fn record_tool_messages(messages: Vec<crate::types::Message>) -> Vec<Self::Update> {
        Self::append_messages(messages)
    }

    fn last_message(&self) -> Option<&crate::types::Message> {
        self.messages().last()
    }
}
