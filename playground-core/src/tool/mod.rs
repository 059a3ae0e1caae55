use crate::types::ToolError;
use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait implemented by typed tool functions
#[async_trait]
pub trait ToolFunction: Send + Sync {
    /// The parameter type for the tool
    type Params: JsonSchema + DeserializeOwned + Send;
    /// The response type for the tool
    type Response: Serialize + Send;

    /// Get the name of the tool
    fn name() -> &'static str;

    /// Get a description of what the tool does
    fn description() -> &'static str;

    /// Get the JSON Schema for the tool's parameters
    fn parameters_schema() -> Value {
        let mut schema = serde_json::to_value(schemars::schema_for!(Self::Params))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
        }
        schema
    }

    /// Get the complete tool schema for the chat completions API
    fn get_schema() -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: Self::name().to_string(),
                description: Some(Self::description().to_string()),
                parameters: Some(Self::parameters_schema()),
                strict: None,
            },
        }
    }

    /// Execute the tool with the given parameters
    async fn execute(&self, params: Self::Params) -> Result<Self::Response, ToolError>;
}

/// Object-safe view of a tool, used to dispatch model tool calls by name
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> ChatCompletionTool;

    /// Run the tool on raw JSON arguments; the output is rendered as text
    async fn call(&self, args: &Value) -> Result<String, ToolError>;
}

#[async_trait]
impl<T> Tool for T
where
    T: ToolFunction + 'static,
{
    fn name(&self) -> &str {
        <T as ToolFunction>::name()
    }

    fn schema(&self) -> ChatCompletionTool {
        T::get_schema()
    }

    async fn call(&self, args: &Value) -> Result<String, ToolError> {
        // Arguments that were not valid JSON reach us as a raw string
        let params: T::Params = match args {
            Value::String(raw) => serde_json::from_str(raw)?,
            other => serde_json::from_value(other.clone())?,
        };
        let response = self.execute(params).await?;
        match serde_json::to_value(&response)? {
            Value::String(text) => Ok(text),
            other => Ok(other.to_string()),
        }
    }
}

/// Tools available to a graph, addressed by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; a tool with the same name replaces the previous one
    pub fn register<T: Tool + 'static>(mut self, tool: T) -> Self {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => self.tools[slot] = Arc::new(tool),
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(Arc::new(tool));
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&slot| &self.tools[slot])
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|tool| tool.name()).collect()
    }

    /// Schemas to bind to a model request
    pub fn schemas(&self) -> Vec<ChatCompletionTool> {
        self.tools.iter().map(|tool| tool.schema()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}
