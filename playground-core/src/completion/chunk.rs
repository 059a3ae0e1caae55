use async_openai::types::CompletionUsage;
use serde::{Deserialize, Serialize};

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<&CompletionUsage> for Usage {
    fn from(usage: &CompletionUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

/// One streamed piece of model output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatChunk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatChunk {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn reasoning(reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: Some(reasoning.into()),
            ..Self::default()
        }
    }

    pub fn usage(usage: Usage) -> Self {
        Self {
            usage: Some(usage),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.reasoning.is_none() && self.usage.is_none()
    }
}

// Wire shape of an OpenAI-compatible stream chunk. Only the fields the
// playground renders are kept; `reasoning_content` is a provider extension.
#[derive(Deserialize)]
struct RawStreamChunk {
    #[serde(default)]
    choices: Vec<RawChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct RawChoice {
    #[serde(default)]
    delta: RawDelta,
}

#[derive(Deserialize, Default)]
struct RawDelta {
    content: Option<String>,
    reasoning_content: Option<String>,
    reasoning: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}

/// Parses the `data:` payload of one SSE event
pub(crate) fn parse_stream_data(data: &str) -> Result<ChatChunk, serde_json::Error> {
    let raw: RawStreamChunk = serde_json::from_str(data)?;
    let delta = raw
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.delta)
        .unwrap_or_default();

    Ok(ChatChunk {
        content: non_empty(delta.content),
        reasoning: non_empty(delta.reasoning_content).or_else(|| non_empty(delta.reasoning)),
        usage: raw.usage,
    })
}
