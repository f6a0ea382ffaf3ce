// Model Context Protocol surface
pub mod server;
pub mod types;

pub use server::McpServer;
