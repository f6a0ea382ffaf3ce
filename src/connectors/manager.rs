// Connector Manager - Routes tool calls to appropriate connector
use super::tool::{ToolDefinition, ToolOutput};
use super::{catalog, Connector};
use crate::config::McpConfig;
use crate::context::{ClientRegistry, ConnectorDescriptor, ExecutionContext, ResourceContent, ResourceDescriptor, StaticContext};
use crate::errors::{McpError, McpResult};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Registered {
    connector: Connector,
    context: Arc<dyn ExecutionContext>,
}

pub struct ConnectorManager {
    connectors: BTreeMap<String, Registered>,
    clients: Arc<ClientRegistry>,
}

impl ConnectorManager {
    /// Register every enabled connector with values from the process
    /// environment.
    pub fn new(config: &McpConfig) -> McpResult<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(config, &vars)
    }

    pub fn from_vars(config: &McpConfig, vars: &HashMap<String, String>) -> McpResult<Self> {
        let mut manager = Self::empty(Arc::new(ClientRegistry::new(config.request_timeout())));

        if let Some(keys) = &config.enabled_connectors {
            for key in keys {
                if !catalog().iter().any(|(known, _)| known == key) {
                    warn!(connector = %key, "Unknown connector in MCP_CONNECTORS, ignoring");
                }
            }
        }

        for (key, factory) in catalog() {
            if !config.is_connector_enabled(key) {
                debug!(connector = %key, "Connector disabled");
                continue;
            }

            let connector = factory()?;
            let context = context_from_vars(connector.descriptor(), manager.clients.clone(), vars);
            manager.register(connector, Arc::new(context))?;
        }

        info!(connectors = manager.connector_count(), "Connectors registered");
        Ok(manager)
    }

    pub fn empty(clients: Arc<ClientRegistry>) -> Self {
        Self {
            connectors: BTreeMap::new(),
            clients,
        }
    }

    pub fn clients(&self) -> Arc<ClientRegistry> {
        self.clients.clone()
    }

    pub fn register(&mut self, connector: Connector, context: Arc<dyn ExecutionContext>) -> McpResult<()> {
        let key = connector.key().to_string();
        if self.connectors.contains_key(&key) {
            return Err(McpError::InvalidDeclaration(format!("connector '{}' registered twice", key)));
        }

        self.connectors.insert(key, Registered { connector, context });
        Ok(())
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    pub fn descriptors(&self) -> Vec<ConnectorDescriptor> {
        self.connectors.values().map(|r| r.connector.descriptor().clone()).collect()
    }

    /// List all tools from all connectors as "connector.tool"
    pub fn list_all_tools(&self) -> Vec<ToolDefinition> {
        self.connectors
            .iter()
            .flat_map(|(key, registered)| {
                registered.connector.tool_definitions().into_iter().map(move |mut tool| {
                    tool.name = format!("{}.{}", key, tool.name);
                    tool
                })
            })
            .collect()
    }

    pub fn list_all_resources(&self) -> Vec<ResourceDescriptor> {
        self.connectors
            .values()
            .flat_map(|r| r.connector.resource_descriptors())
            .collect()
    }

    /// Call a tool - routes to appropriate connector based on prefix
    /// Tool names are: "connector.tool_name" (e.g. "slack.post_message")
    pub async fn call_tool(&self, fully_qualified_name: &str, args: Value) -> McpResult<ToolOutput> {
        let (connector_id, tool_name) = fully_qualified_name.split_once('.').ok_or_else(|| {
            McpError::InvalidArguments(format!(
                "Tool name must be in format 'connector.tool': {}",
                fully_qualified_name
            ))
        })?;

        let registered = self.connectors.get(connector_id).ok_or_else(|| {
            McpError::ToolNotFound(format!("Connector not found or disabled: {}", connector_id))
        })?;

        registered
            .connector
            .call_tool(tool_name, args, registered.context.clone())
            .await
            .ok_or_else(|| McpError::ToolNotFound(fully_qualified_name.to_string()))
    }

    /// Read a resource - routes based on URI scheme
    pub async fn read_resource(&self, uri: &str) -> McpResult<ResourceContent> {
        let (connector_id, _) = uri
            .split_once("://")
            .ok_or_else(|| McpError::InvalidArguments(format!("Invalid resource URI format: {}", uri)))?;

        let registered = self
            .connectors
            .get(connector_id)
            .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))?;

        registered
            .connector
            .read_resource(uri, registered.context.clone())
            .await
            .ok_or_else(|| McpError::ResourceNotFound(uri.to_string()))
    }
}

/// Environment variable holding `field` for `connector`, e.g.
/// `SPOTIFY_ACCESS_TOKEN`.
pub fn env_var_name(connector: &str, field: &str) -> String {
    format!("{}_{}", connector, field).to_ascii_uppercase()
}

/// Collect a connector's declared credentials and setup from `vars`.
pub fn context_from_vars(
    descriptor: &ConnectorDescriptor,
    clients: Arc<ClientRegistry>,
    vars: &HashMap<String, String>,
) -> StaticContext {
    let mut context = StaticContext::new(descriptor.setup.clone(), clients);

    for field in &descriptor.credentials {
        if let Some(value) = vars.get(&env_var_name(&descriptor.key, &field.name)) {
            context = context.with_credential(&field.name, value.clone());
        }
    }
    for field in &descriptor.setup {
        if let Some(value) = vars.get(&env_var_name(&descriptor.key, &field.name)) {
            context = context.with_setup(&field.name, value.clone());
        }
    }

    context
}
