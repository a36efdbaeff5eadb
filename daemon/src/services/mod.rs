mod info;
mod mcp;
mod tools;

pub use mcp::McpServer;
pub use tools::ToolService;
