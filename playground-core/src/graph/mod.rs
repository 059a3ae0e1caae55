mod core;
mod edges;
mod event;
mod marker;

pub use core::{Graph, DEFAULT_RECURSION_LIMIT, END, START};
pub use edges::{Condition, Edge};
pub use event::{GraphEvent, GraphEventStream, NodeEvent};
pub use marker::{Built, NotBuilt};
