mod error;
mod message;
mod result;
mod state;

pub use error::{CompletionError, GraphError, NodeError, ToolError};
pub use message::{to_request_messages, Message, MessageType, ToolCall};
pub use result::{GraphResult, NodeOutput, NodeResult};
pub use state::{GraphState, MessagesState};
