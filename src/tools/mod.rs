//! Tools the orchestrator can offer to the model.

mod weather;

pub use weather::{WeatherParams, WeatherTool};

use playground_core::ToolRegistry;

/// Registry holding every tool the chat flow binds
pub fn default_tools() -> ToolRegistry {
    ToolRegistry::new().register(WeatherTool)
}
