// Shared helpers for connector integration tests
#![allow(dead_code)]

use mcp_connectors::connectors::{Connector, ToolOutput};
use mcp_connectors::context::{ClientRegistry, ResourceContent, StaticContext};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Context with no values set, using the connector's declared setup fields.
pub fn context_for(connector: &Connector) -> StaticContext {
    StaticContext::new(
        connector.descriptor().setup.clone(),
        Arc::new(ClientRegistry::new(Duration::from_secs(5))),
    )
}

pub async fn call(connector: &Connector, context: StaticContext, tool: &str, args: Value) -> ToolOutput {
    connector
        .call_tool(tool, args, Arc::new(context))
        .await
        .unwrap_or_else(|| panic!("tool {} is not registered", tool))
}

pub async fn read(connector: &Connector, context: StaticContext, uri: &str) -> ResourceContent {
    connector
        .read_resource(uri, Arc::new(context))
        .await
        .unwrap_or_else(|| panic!("resource {} is not registered", uri))
}

/// Parse a successful tool result as JSON.
pub fn json_of(output: &ToolOutput) -> Value {
    assert!(!output.is_error, "tool failed: {}", output.text);
    serde_json::from_str(&output.text).expect("tool output should be JSON")
}
