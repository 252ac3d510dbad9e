pub mod server;
pub mod tools;

pub use server::McpServer;
pub use tools::{Tool, ToolContext, ToolOutput};
