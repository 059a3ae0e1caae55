use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseMessage, ChatCompletionToolType, FunctionCall,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Represents different types of messages in the system
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Human,
    AI,
    System,
    Tool,
}

/// Represents a tool call with its arguments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Parsed JSON arguments. Arguments the model sent that are not valid
    /// JSON are kept verbatim as a JSON string.
    pub args: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, args: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            args,
        }
    }

    fn from_openai(call: &ChatCompletionMessageToolCall) -> Self {
        let args = serde_json::from_str(&call.function.arguments)
            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
        Self::new(call.id.clone(), call.function.name.clone(), args)
    }

    fn to_openai(&self) -> ChatCompletionMessageToolCall {
        let arguments = match &self.args {
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        ChatCompletionMessageToolCall {
            id: self.id.clone(),
            r#type: ChatCompletionToolType::Function,
            function: FunctionCall {
                name: self.name.clone(),
                arguments,
            },
        }
    }
}

/// Represents a message in the system
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub message_type: MessageType,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<HashMap<String, Value>>,
}

impl Message {
    fn with_type(message_type: MessageType, content: impl Into<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
            tool_calls: None,
            tool_call_id: None,
            status: None,
            additional: None,
        }
    }

    /// Creates a new human message
    pub fn human(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::Human, content)
    }

    /// Creates a new AI message
    pub fn ai(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::AI, content)
    }

    /// Creates a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_type(MessageType::System, content)
    }

    /// Creates a new tool message answering the call `tool_call_id`
    pub fn tool(
        content: impl Into<String>,
        tool_call_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        let mut message = Self::with_type(MessageType::Tool, content);
        message.tool_call_id = Some(tool_call_id.into());
        message.status = Some(status.into());
        message
    }

    /// Adds tool calls to the message
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }

    /// Adds additional data to the message
    pub fn with_additional(mut self, key: impl Into<String>, value: Value) -> Self {
        self.additional
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }

    pub fn additional_value(&self, key: &str) -> Option<&Value> {
        self.additional.as_ref().and_then(|extra| extra.get(key))
    }

    pub fn is_tool(&self) -> bool {
        self.message_type == MessageType::Tool
    }

    /// True for AI messages carrying at least one tool call
    pub fn has_tool_calls(&self) -> bool {
        self.message_type == MessageType::AI
            && self.tool_calls.as_ref().is_some_and(|calls| !calls.is_empty())
    }

    /// Builds an AI message from a provider response
    pub fn from_response(response: &ChatCompletionResponseMessage) -> Self {
        let message = Self::ai(response.content.clone().unwrap_or_default());
        match &response.tool_calls {
            Some(calls) if !calls.is_empty() => {
                message.with_tool_calls(calls.iter().map(ToolCall::from_openai).collect())
            }
            _ => message,
        }
    }

    /// Converts to the wire message sent to the provider
    pub fn to_request_message(&self) -> Result<ChatCompletionRequestMessage, OpenAIError> {
        let message = match self.message_type {
            MessageType::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(self.content.clone())
                .build()?
                .into(),
            MessageType::Human => ChatCompletionRequestUserMessageArgs::default()
                .content(self.content.clone())
                .build()?
                .into(),
            MessageType::AI => {
                let mut builder = ChatCompletionRequestAssistantMessageArgs::default();
                if !self.content.is_empty() {
                    builder.content(self.content.clone());
                }
                if let Some(calls) = self.tool_calls.as_ref().filter(|calls| !calls.is_empty()) {
                    builder.tool_calls(calls.iter().map(ToolCall::to_openai).collect::<Vec<_>>());
                }
                builder.build()?.into()
            }
            MessageType::Tool => ChatCompletionRequestToolMessageArgs::default()
                .content(self.content.clone())
                .tool_call_id(self.tool_call_id.clone().unwrap_or_default())
                .build()?
                .into(),
        };
        Ok(message)
    }
}

/// Converts a list of messages to wire messages
pub fn to_request_messages(
    messages: &[Message],
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    messages.iter().map(Message::to_request_message).collect()
}
