use crate::types::{GraphError, GraphResult};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result};
use std::sync::Arc;

/// Represents a condition for edge transitions
pub type Condition<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// Edge definition for graph transitions
#[derive(Clone)]
pub enum Edge<S> {
    /// Direct edge to next node
    Direct(String),
    /// Conditional edge based on state; the condition returns the next node
    Conditional(Condition<S>),
    /// Conditional edge whose condition returns a label looked up in a path map
    Routed {
        condition: Condition<S>,
        path_map: HashMap<String, String>,
    },
}

impl<S> Edge<S> {
    /// Resolve the next node for `state`
    pub fn next(&self, from: &str, state: &S) -> GraphResult<String> {
        match self {
            Edge::Direct(target) => Ok(target.clone()),
            Edge::Conditional(condition) => Ok(condition(state)),
            Edge::Routed {
                condition,
                path_map,
            } => {
                let label = condition(state);
                path_map.get(&label).cloned().ok_or_else(|| {
                    GraphError::InvalidTransition(format!(
                        "Condition on {} returned unmapped label: {}",
                        from, label
                    ))
                })
            }
        }
    }

    /// Targets known before running, used for validation
    pub fn static_targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(target) => vec![target.as_str()],
            Edge::Conditional(_) => Vec::new(),
            Edge::Routed { path_map, .. } => path_map.values().map(String::as_str).collect(),
        }
    }
}

// Manual Debug implementation
impl<S> Debug for Edge<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional(_) => f
                .debug_tuple("Conditional")
                .field(&"<condition>") // Placeholder for the function
                .finish(),
            Edge::Routed { path_map, .. } => f
                .debug_struct("Routed")
                .field("condition", &"<condition>")
                .field("path_map", path_map)
                .finish(),
        }
    }
}
