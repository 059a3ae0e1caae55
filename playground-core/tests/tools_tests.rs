use async_trait::async_trait;
use playground_core::prelude::*;
use playground_macros::State;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AddParams {
    /// First operand
    x: i32,
    /// Second operand
    y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddResponse {
    sum: i32,
}

#[derive(Clone)]
struct AddTool;

#[async_trait]
impl ToolFunction for AddTool {
    type Params = AddParams;
    type Response = AddResponse;

    fn name() -> &'static str {
        "add"
    }

    fn description() -> &'static str {
        "Adds two numbers"
    }

    async fn execute(&self, params: AddParams) -> Result<AddResponse, ToolError> {
        Ok(AddResponse {
            sum: params.x + params.y,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EchoParams {
    text: String,
}

#[derive(Clone)]
struct EchoTool;

#[async_trait]
impl ToolFunction for EchoTool {
    type Params = EchoParams;
    type Response = String;

    fn name() -> &'static str {
        "echo"
    }

    fn description() -> &'static str {
        "Echoes text back"
    }

    async fn execute(&self, params: EchoParams) -> Result<String, ToolError> {
        if params.text.is_empty() {
            return Err(ToolError::Execution("nothing to echo".into()));
        }
        Ok(params.text)
    }
}

#[tokio::test]
async fn test_add_tool_execution() {
    assert_eq!(<AddTool as ToolFunction>::name(), "add");
    assert_eq!(<AddTool as ToolFunction>::description(), "Adds two numbers");

    let result = ToolFunction::execute(&AddTool, AddParams { x: 7, y: 3 })
        .await
        .unwrap();
    assert_eq!(result.sum, 10);
}

#[test]
fn test_add_tool_schema() {
    let schema = <AddTool as ToolFunction>::get_schema();

    assert_eq!(schema.function.name, "add");
    assert_eq!(
        schema.function.description.as_deref(),
        Some("Adds two numbers")
    );

    let params = schema.function.parameters.as_ref().unwrap();
    assert_eq!(params["type"], "object");
    assert_eq!(params["properties"]["x"]["type"], "integer");
    assert_eq!(params["properties"]["y"]["description"], "Second operand");
    assert_eq!(params["required"], json!(["x", "y"]));
    assert!(params.get("$schema").is_none());
}

#[tokio::test]
async fn test_dynamic_call_renders_output() {
    let registry = ToolRegistry::new().register(AddTool).register(EchoTool);
    assert_eq!(registry.names(), vec!["add", "echo"]);
    assert_eq!(registry.schemas().len(), 2);

    let add = registry.get("add").unwrap();
    assert_eq!(add.call(&json!({"x": 1, "y": 2})).await.unwrap(), r#"{"sum":3}"#);
    // Raw string arguments are parsed as JSON
    assert_eq!(
        add.call(&json!(r#"{"x": 4, "y": 4}"#)).await.unwrap(),
        r#"{"sum":8}"#
    );

    // String responses are passed through without quoting
    let echo = registry.get("echo").unwrap();
    assert_eq!(echo.call(&json!({"text": "hi"})).await.unwrap(), "hi");

    let err = add.call(&json!({"x": "one"})).await.unwrap_err();
    assert!(matches!(err, ToolError::Serialization(_)));
    assert!(registry.get("missing").is_none());
}

#[test]
fn test_register_replaces_same_name() {
    let registry = ToolRegistry::new().register(AddTool).register(AddTool);
    assert_eq!(registry.len(), 1);
}

#[derive(State, Debug, Clone, Default)]
struct AgentState {
    #[update(append)]
    messages: Vec<Message>,
    #[update(append)]
    outputs: Vec<String>,
}

impl MessagesState for AgentState {
    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn append_messages(messages: Vec<Message>) -> Vec<AgentStateUpdate> {
        vec![AgentStateUpdate::Messages(messages)]
    }

    fn record_tool_messages(messages: Vec<Message>) -> Vec<AgentStateUpdate> {
        let outputs = messages.iter().map(|m| m.content.clone()).collect();
        vec![
            AgentStateUpdate::Messages(messages),
            AgentStateUpdate::Outputs(outputs),
        ]
    }
}

#[test]
fn test_tools_condition() {
    let mut state = AgentState::default();
    assert_eq!(tools_condition(&state), END);

    state.messages.push(Message::human("add 1 and 2"));
    assert_eq!(tools_condition(&state), END);

    state.messages.push(
        Message::ai("").with_tool_calls(vec![ToolCall::new("c1", "add", json!({"x": 1, "y": 2}))]),
    );
    assert_eq!(tools_condition(&state), TOOLS);

    state.messages.push(Message::ai("3"));
    assert_eq!(tools_condition(&state), END);
}

#[tokio::test]
async fn test_tool_node_executes_calls() {
    let registry = ToolRegistry::new().register(AddTool).register(EchoTool);
    let node: ToolNode<AgentState> = ToolNode::new("tools", registry);

    let mut state = AgentState::default();
    state.messages.push(Message::ai("").with_tool_calls(vec![
        ToolCall::new("c1", "add", json!({"x": 2, "y": 2})),
        ToolCall::new("c2", "echo", json!({"text": ""})),
        ToolCall::new("c3", "subtract", json!({})),
    ]));

    let output = node.process(&Context::default(), state.clone()).await.unwrap();
    match output {
        NodeOutput::Updates(updates) => state.apply_many(updates),
        NodeOutput::Full(_) => panic!("tool node must produce updates"),
    }

    let tool_messages: Vec<&Message> = state.messages.iter().filter(|m| m.is_tool()).collect();
    assert_eq!(tool_messages.len(), 3);

    assert_eq!(tool_messages[0].content, r#"{"sum":4}"#);
    assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("c1"));
    assert_eq!(tool_messages[0].status.as_deref(), Some("success"));

    assert_eq!(tool_messages[1].status.as_deref(), Some("error"));
    assert!(tool_messages[1].content.contains("nothing to echo"));

    assert_eq!(tool_messages[2].status.as_deref(), Some("error"));
    assert!(tool_messages[2].content.contains("Unknown tool: subtract"));

    assert_eq!(state.outputs.len(), 3);
}

#[tokio::test]
async fn test_tool_graph_with_condition() {
    let decide = FunctionNode::new("decide", |_ctx, state: AgentState| async move {
        let reply = match state.messages.iter().filter(|m| m.is_tool()).count() {
            0 => Message::ai("").with_tool_calls(vec![ToolCall::new(
                "c1",
                "add",
                json!({"x": 20, "y": 22}),
            )]),
            _ => Message::ai("done"),
        };
        Ok(NodeOutput::Updates(AgentState::append_messages(vec![reply])))
    });

    let built_graph = {
        let mut graph = Graph::new("agent");
        graph
            .add_node(decide)
            .add_node(ToolNode::new("run_tools", ToolRegistry::new().register(AddTool)))
            .add_edge(START, "decide")
            .add_conditional_edges(
                "decide",
                tools_condition::<AgentState>,
                [(TOOLS, "run_tools"), (END, END)],
            )
            .add_edge("run_tools", "decide");
        graph.build().unwrap()
    };

    let mut initial = AgentState::default();
    initial.messages.push(Message::human("what is 20 + 22?"));
    let final_state = built_graph.run(&Context::default(), initial).await.unwrap();

    assert_eq!(final_state.outputs, vec![r#"{"sum":42}"#]);
    assert_eq!(final_state.messages.last().unwrap().content, "done");
    assert_eq!(final_state.messages.len(), 4);
}
