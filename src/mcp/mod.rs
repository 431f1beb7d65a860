//! MCP (Model Context Protocol) module
//!
//! Implements the MCP server protocol for tool invocation.

pub mod response;
pub mod server;
pub mod tools;
pub mod types;

pub use response::{ToolError, ToolResponse, ToolResult};
pub use server::McpServer;
pub use tools::{feature_registry, ToolHandler};
