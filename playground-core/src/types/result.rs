use super::error::{GraphError, NodeError};
use super::state::GraphState;
use std::fmt::{Debug, Formatter};

pub enum NodeOutput<S>
where
    S: GraphState,
{
    /// The node has produced an entirely new state.
    Full(S),

    /// The node has produced zero or more updates to the existing state.
    Updates(Vec<S::Update>),
}

impl<S: GraphState> Debug for NodeOutput<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeOutput::Full(state) => f.debug_tuple("Full").field(state).finish(),
            NodeOutput::Updates(updates) => f.debug_tuple("Updates").field(updates).finish(),
        }
    }
}

pub type NodeResult<S> = Result<NodeOutput<S>, NodeError>;

pub type GraphResult<T> = Result<T, GraphError>;
