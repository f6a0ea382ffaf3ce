// Connector - a descriptor bound to its tools and resources
use super::tool::{Resource, Tool, ToolDefinition, ToolOutput};
use crate::context::{ConnectorDescriptor, ExecutionContext, ResourceContent, ResourceDescriptor};
use crate::errors::{McpError, McpResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct Connector {
    descriptor: ConnectorDescriptor,
    tools: BTreeMap<String, Tool>,
    resources: BTreeMap<String, Resource>,
}

impl Connector {
    pub fn builder(descriptor: ConnectorDescriptor) -> ConnectorBuilder {
        ConnectorBuilder {
            descriptor,
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn descriptor(&self) -> &ConnectorDescriptor {
        &self.descriptor
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.get(uri)
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition().clone()).collect()
    }

    pub fn resource_descriptors(&self) -> Vec<ResourceDescriptor> {
        self.resources.values().map(|r| r.descriptor().clone()).collect()
    }

    /// Invoke a tool by exact name. Failures come back as text with
    /// `is_error` set; only an unknown name yields `None`.
    pub async fn call_tool(
        &self,
        name: &str,
        args: Value,
        context: Arc<dyn ExecutionContext>,
    ) -> Option<ToolOutput> {
        let tool = self.tool(name)?;
        let label = format!("{}.{}", self.descriptor.key, name);

        debug!(tool = %label, "Invoking tool");

        let output = match tool.invoke(args, context).await {
            Ok(text) => ToolOutput::success(text),
            Err(e) => {
                warn!(tool = %label, kind = %e.kind, status = ?e.status, "Tool call failed: {}", e);
                ToolOutput::failure(e.render(&label))
            }
        };

        Some(output)
    }

    /// Read a resource by exact URI with the same "always text" discipline.
    pub async fn read_resource(
        &self,
        uri: &str,
        context: Arc<dyn ExecutionContext>,
    ) -> Option<ResourceContent> {
        let resource = self.resource(uri)?;

        let content = match resource.read(context).await {
            Ok(text) => ResourceContent {
                uri: uri.to_string(),
                mime_type: resource.descriptor().mime_type.clone(),
                text,
            },
            Err(e) => {
                warn!(uri = %uri, kind = %e.kind, "Resource read failed: {}", e);
                ResourceContent {
                    uri: uri.to_string(),
                    mime_type: "text/plain".to_string(),
                    text: e.render(uri),
                }
            }
        };

        Some(content)
    }
}

pub struct ConnectorBuilder {
    descriptor: ConnectorDescriptor,
    tools: Vec<Tool>,
    resources: Vec<Resource>,
}

impl ConnectorBuilder {
    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Validate the whole declaration at once; nothing is registered on error.
    pub fn build(self) -> McpResult<Connector> {
        let key = self.descriptor.key.clone();

        if key.is_empty() || !key.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(McpError::InvalidDeclaration(format!(
                "connector key must be lowercase alphanumeric: '{}'",
                key
            )));
        }

        let mut tools = BTreeMap::new();
        for tool in self.tools {
            let name = tool.name().to_string();
            if name.is_empty() || name.contains('.') {
                return Err(McpError::InvalidDeclaration(format!(
                    "invalid tool name '{}' in connector '{}'",
                    name, key
                )));
            }
            if tools.insert(name.clone(), tool).is_some() {
                return Err(McpError::InvalidDeclaration(format!(
                    "duplicate tool '{}' in connector '{}'",
                    name, key
                )));
            }
        }

        let scheme = format!("{}://", key);
        let mut resources = BTreeMap::new();
        for resource in self.resources {
            let uri = resource.uri().to_string();
            if !uri.starts_with(&scheme) {
                return Err(McpError::InvalidDeclaration(format!(
                    "resource '{}' must use the '{}' scheme",
                    uri, scheme
                )));
            }
            if resources.insert(uri.clone(), resource).is_some() {
                return Err(McpError::InvalidDeclaration(format!(
                    "duplicate resource '{}' in connector '{}'",
                    uri, key
                )));
            }
        }

        Ok(Connector {
            descriptor: self.descriptor,
            tools,
            resources,
        })
    }
}
