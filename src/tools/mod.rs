//! Tools the model can invoke, and the dispatch table that runs them.

pub mod arguments;
pub mod builtin;
pub mod registry;
pub mod result;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use registry::ToolRegistry;
pub use result::ToolResult;
pub use tool::{AgentTool, Tool};
pub use types::AgentToolParameters;
