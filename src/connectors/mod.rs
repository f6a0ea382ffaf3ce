// Connector Architecture - declarative adapters over third-party APIs
pub mod connector;
pub mod http;
pub mod manager;
pub mod sse;
pub mod tool;

pub mod bamboohr;
pub mod browserbase;
pub mod google_maps;
pub mod n8n;
pub mod pokeapi;
pub mod slack;
pub mod sonarqube;
pub mod spotify;
pub mod wikimedia;

pub use connector::{Connector, ConnectorBuilder};
pub use manager::ConnectorManager;
pub use tool::{Resource, Tool, ToolDefinition, ToolInput, ToolOutput};

use crate::errors::McpResult;

pub type ConnectorFactory = fn() -> McpResult<Connector>;

/// Every connector this crate ships, keyed by connector key.
pub fn catalog() -> Vec<(&'static str, ConnectorFactory)> {
    vec![
        (bamboohr::KEY, bamboohr::connector as ConnectorFactory),
        (browserbase::KEY, browserbase::connector),
        (google_maps::KEY, google_maps::connector),
        (n8n::KEY, n8n::connector),
        (pokeapi::KEY, pokeapi::connector),
        (slack::KEY, slack::connector),
        (sonarqube::KEY, sonarqube::connector),
        (spotify::KEY, spotify::connector),
        (wikimedia::KEY, wikimedia::connector),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_shipped_connector_registers() {
        for (key, factory) in catalog() {
            let connector = factory().unwrap_or_else(|e| panic!("{} failed to register: {}", key, e));
            assert_eq!(connector.key(), key);
            assert!(!connector.tool_definitions().is_empty(), "{} has no tools", key);
            for tool in connector.tool_definitions() {
                assert_eq!(tool.input_schema["type"], "object", "{}.{}", key, tool.name);
            }
        }
    }
}
