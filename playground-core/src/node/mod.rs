mod config;
mod context;
mod core;
mod function;
mod tool;

pub use config::{NodeConfig, NodeConfigBuilder};
pub use context::Context;
pub use core::Node;
pub use function::FunctionNode;
pub use tool::{tools_condition, ToolNode, TOOLS};
