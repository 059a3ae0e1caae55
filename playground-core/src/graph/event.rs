use crate::completion::ChatChunk;
use crate::types::GraphResult;
use futures::Stream;
use std::pin::Pin;

/// Progress reported while a node runs
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    Started { node: String },
    /// A piece of model output streamed from inside a node
    Chunk { node: String, chunk: ChatChunk },
    Finished { node: String },
}

impl NodeEvent {
    pub fn node(&self) -> &str {
        match self {
            NodeEvent::Started { node }
            | NodeEvent::Chunk { node, .. }
            | NodeEvent::Finished { node } => node,
        }
    }
}

/// Items of [`super::Graph::stream`]
#[derive(Debug, Clone)]
pub enum GraphEvent<S> {
    Node(NodeEvent),
    /// Final state; always the last item of a successful run
    Completed(S),
}

pub type GraphEventStream<S> = Pin<Box<dyn Stream<Item = GraphResult<GraphEvent<S>>> + Send>>;
