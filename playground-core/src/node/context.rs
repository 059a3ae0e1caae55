use crate::completion::ChatChunk;
use crate::graph::NodeEvent;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// Context for node execution
#[derive(Debug, Clone)]
pub struct Context {
    /// Parent trace identifier
    pub parent_trace_id: Option<String>,
    /// Unique identifier for tracing
    pub trace_id: String,
    /// Name of the node currently executing, if any
    pub node: Option<String>,
    /// Additional metadata
    pub metadata: HashMap<String, String>,
    events: Option<UnboundedSender<NodeEvent>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl Context {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            parent_trace_id: None,
            trace_id: trace_id.into(),
            node: None,
            metadata: HashMap::new(),
            events: None,
        }
    }

    pub fn with_parent_trace_id(mut self, parent_trace_id: impl Into<String>) -> Self {
        self.parent_trace_id = Some(parent_trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attaches the channel node events are published on
    pub fn with_events(mut self, events: UnboundedSender<NodeEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Child context for one node attempt: fresh trace id, parented to this one.
    pub fn for_node(&self, node: impl Into<String>) -> Self {
        Self {
            parent_trace_id: Some(self.trace_id.clone()),
            trace_id: uuid::Uuid::new_v4().to_string(),
            node: Some(node.into()),
            metadata: self.metadata.clone(),
            events: self.events.clone(),
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.events.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Publishes a streamed chunk on behalf of the current node.
    ///
    /// Returns `false` when nobody is listening anymore.
    pub fn emit(&self, chunk: ChatChunk) -> bool {
        let node = self.node.clone().unwrap_or_default();
        self.send(NodeEvent::Chunk { node, chunk })
    }

    pub(crate) fn send(&self, event: NodeEvent) -> bool {
        match &self.events {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }
}
