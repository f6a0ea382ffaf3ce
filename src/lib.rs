// MCP Connectors - declarative third-party API adapters served over the
// Model Context Protocol

pub mod api;
pub mod config;
pub mod connectors;
pub mod context;
pub mod errors;
pub mod mcp;

pub use config::McpConfig;
pub use connectors::{Connector, ConnectorManager};
pub use errors::{ConnectorError, ErrorKind, McpError, McpResult};
pub use mcp::McpServer;
