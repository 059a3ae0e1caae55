use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::*;
use crate::node::*;
use crate::types::*;

pub const START: &str = "_START_";
pub const END: &str = "_END_";

/// Maximum number of node executions in one run
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// A graph that executes nodes in a defined order
#[derive(Debug)]
pub struct Graph<S: GraphState, BuildState = NotBuilt> {
    graph_name: String,
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: HashMap<String, Edge<S>>,
    configs: HashMap<String, NodeConfig>,
    recursion_limit: usize,
    _build_state: std::marker::PhantomData<BuildState>,
}

impl<S> Graph<S, NotBuilt>
where
    S: GraphState,
{
    /// Create a new graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph_name: name.into(),
            nodes: HashMap::new(),
            edges: HashMap::new(),
            configs: HashMap::new(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            _build_state: std::marker::PhantomData,
        }
    }

    /// Add a node to the graph
    pub fn add_node<N>(&mut self, node: N) -> &mut Self
    where
        N: Node<S> + 'static,
    {
        self.nodes.insert(node.name().to_string(), Arc::new(node));
        self
    }

    /// Add a direct edge between nodes
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.insert(from.into(), Edge::Direct(to.into()));
        self
    }

    /// Add a conditional edge from a node; the condition names the next node
    pub fn add_conditional_edge<F>(&mut self, from: impl Into<String>, condition: F) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
    {
        self.edges
            .insert(from.into(), Edge::Conditional(Arc::new(condition)));
        self
    }

    /// Add a conditional edge whose condition returns a label resolved
    /// through `path_map`
    pub fn add_conditional_edges<F, I, K, V>(
        &mut self,
        from: impl Into<String>,
        condition: F,
        path_map: I,
    ) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let path_map = path_map
            .into_iter()
            .map(|(label, target)| (label.into(), target.into()))
            .collect();
        self.edges.insert(
            from.into(),
            Edge::Routed {
                condition: Arc::new(condition),
                path_map,
            },
        );
        self
    }

    /// Configure a node with specific settings
    pub fn configure_node(&mut self, name: impl Into<String>, config: NodeConfig) -> &mut Self {
        self.configs.insert(name.into(), config);
        self
    }

    /// Cap the number of node executions per run
    pub fn recursion_limit(&mut self, limit: usize) -> &mut Self {
        self.recursion_limit = limit;
        self
    }

    /// Validate the graph structure and make it ready for execution
    pub fn build(self) -> GraphResult<Graph<S, Built>> {
        if !self.edges.contains_key(START) {
            return Err(GraphError::InvalidState(format!(
                "Graph {} has no entry point (missing edge from {})",
                self.graph_name, START
            )));
        }

        for reserved in [START, END] {
            if self.nodes.contains_key(reserved) {
                return Err(GraphError::InvalidState(format!(
                    "{} is a reserved node name",
                    reserved
                )));
            }
        }

        for (from, edge) in &self.edges {
            if from == END {
                return Err(GraphError::InvalidTransition(format!(
                    "Edges cannot leave {}",
                    END
                )));
            }
            if from != START && !self.nodes.contains_key(from) {
                return Err(GraphError::NodeNotFound(from.clone()));
            }
            for target in edge.static_targets() {
                if target != END && !self.nodes.contains_key(target) {
                    return Err(GraphError::NodeNotFound(target.to_string()));
                }
            }
        }

        for name in self.configs.keys() {
            if !self.nodes.contains_key(name) {
                return Err(GraphError::NodeNotFound(name.clone()));
            }
        }

        Ok(Graph {
            graph_name: self.graph_name,
            nodes: self.nodes,
            edges: self.edges,
            configs: self.configs,
            recursion_limit: self.recursion_limit,
            _build_state: std::marker::PhantomData,
        })
    }
}

impl<S: GraphState, B> Graph<S, B> {
    pub fn name(&self) -> &str {
        &self.graph_name
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<S> Graph<S, Built>
where
    S: GraphState,
{
    fn next_node(&self, current_node: &str, state: &S) -> GraphResult<String> {
        match self.edges.get(current_node) {
            Some(edge) => edge.next(current_node, state),
            None => Err(GraphError::InvalidTransition(format!(
                "No transition defined from node: {}",
                current_node
            ))),
        }
    }

    async fn execute_node(
        &self,
        ctx: &Context,
        name: &str,
        node: &Arc<dyn Node<S>>,
        state: &S,
    ) -> GraphResult<NodeOutput<S>> {
        let config = self.configs.get(name).cloned().unwrap_or_default();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let node_ctx = ctx.for_node(name);
            match tokio::time::timeout(
                Duration::from_secs(config.timeout),
                node.process(&node_ctx, state.clone()),
            )
            .await
            {
                Ok(Ok(output)) => return Ok(output),
                Ok(Err(err)) if attempts < config.max_retries => {
                    tracing::warn!(node = name, attempt = attempts, error = %err, "node failed, retrying");
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) if attempts < config.max_retries => {
                    tracing::warn!(node = name, attempt = attempts, timeout = config.timeout, "node timed out, retrying");
                }
                Err(_) => {
                    return Err(NodeError::Execution(format!(
                        "Node {} timed out after {} attempts",
                        name, attempts
                    ))
                    .into())
                }
            }
        }
    }

    /// Run the graph with an initial state
    pub async fn run(&self, ctx: &Context, initial_state: S) -> GraphResult<S> {
        let mut current_state = initial_state;
        let mut current_node = START.to_string();
        let mut steps = 0;

        loop {
            let next_node = self.next_node(&current_node, &current_state)?;
            if next_node == END {
                break;
            }

            steps += 1;
            if steps > self.recursion_limit {
                return Err(GraphError::RecursionLimit(self.recursion_limit));
            }

            let node = self
                .nodes
                .get(&next_node)
                .ok_or_else(|| GraphError::NodeNotFound(next_node.clone()))?;

            tracing::debug!(graph = %self.graph_name, node = %next_node, "entering node");
            ctx.send(NodeEvent::Started {
                node: next_node.clone(),
            });

            let output = self
                .execute_node(ctx, &next_node, node, &current_state)
                .await?;

            current_state = match output {
                NodeOutput::Full(new_state) => new_state,
                NodeOutput::Updates(updates) => {
                    let mut new_state = current_state;
                    new_state.apply_many(updates);
                    new_state
                }
            };

            ctx.send(NodeEvent::Finished {
                node: next_node.clone(),
            });
            current_node = next_node;
        }

        Ok(current_state)
    }

    /// Run the graph on a background task, yielding node events as they
    /// happen and the final state last.
    ///
    /// Dropping the stream aborts the run.
    pub fn stream(self: Arc<Self>, ctx: Context, initial_state: S) -> GraphEventStream<S> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = ctx.with_events(tx);
        let handle = tokio::spawn(async move { self.run(&ctx, initial_state).await });

        Box::pin(async_stream::stream! {
            let _guard = AbortOnDrop(handle.abort_handle());

            while let Some(event) = rx.recv().await {
                yield Ok(GraphEvent::Node(event));
            }

            match handle.await {
                Ok(Ok(state)) => yield Ok(GraphEvent::Completed(state)),
                Ok(Err(err)) => yield Err(err),
                Err(err) => yield Err(GraphError::ExecutionError(err.to_string())),
            }
        })
    }
}

struct AbortOnDrop(tokio::task::AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[async_trait]
impl<S> Node<S> for Graph<S, Built>
where
    S: GraphState,
{
    async fn process(&self, ctx: &Context, state: S) -> NodeResult<S> {
        let new_state = self
            .run(ctx, state)
            .await
            .map_err(|e| NodeError::SubgraphExecution(e.to_string()))?;
        Ok(NodeOutput::Full(new_state))
    }

    fn name(&self) -> &str {
        &self.graph_name
    }
}
