//! Tool and resource declarations.
//!
//! A tool pairs a typed input (deserialized and validated before the handler
//! runs) with a single-shot async handler returning text.

use crate::context::{ExecutionContext, ResourceDescriptor};
use crate::errors::{ConnectorError, ConnectorResult};
use futures::future::{self, BoxFuture, FutureExt};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;

/// Typed tool arguments.
pub trait ToolInput: DeserializeOwned + JsonSchema + Send + 'static {
    /// Constraints serde cannot express (ranges, mutually exclusive fields).
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Result of a tool call as handed back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn success(text: String) -> Self {
        Self { text, is_error: false }
    }

    pub fn failure(text: String) -> Self {
        Self { text, is_error: true }
    }
}

type ToolHandler =
    dyn Fn(Value, Arc<dyn ExecutionContext>) -> BoxFuture<'static, ConnectorResult<String>> + Send + Sync;

pub struct Tool {
    definition: ToolDefinition,
    handler: Arc<ToolHandler>,
}

impl Tool {
    pub fn new<I, F, Fut>(name: &str, description: &str, handler: F) -> Self
    where
        I: ToolInput,
        F: Fn(I, Arc<dyn ExecutionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<String>> + Send + 'static,
    {
        let handler: Arc<ToolHandler> = Arc::new(move |args, context| match parse_input::<I>(args) {
            Ok(input) => handler(input, context).boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        });

        Self {
            definition: ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema: input_schema::<I>(),
            },
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    pub async fn invoke(&self, args: Value, context: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
        (self.handler)(args, context).await
    }
}

/// Deserialize and validate raw arguments. Absent arguments count as `{}`.
pub fn parse_input<I: ToolInput>(args: Value) -> ConnectorResult<I> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };

    let input: I = serde_json::from_value(args)
        .map_err(|e| ConnectorError::invalid_input(format!("invalid arguments: {}", e)))?;

    input.validate().map_err(ConnectorError::invalid_input)?;
    Ok(input)
}

/// JSON Schema for a tool input, without the `$schema` marker.
pub fn input_schema<I: JsonSchema>() -> Value {
    let mut schema = serde_json::to_value(schemars::schema_for!(I)).unwrap_or_else(|_| {
        serde_json::json!({ "type": "object" })
    });

    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
    }
    schema
}

/// Range check shared by input validators.
pub fn ensure_range(field: &str, value: u64, min: u64, max: u64) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("{} must be between {} and {}, got {}", field, min, max, value));
    }
    Ok(())
}

pub fn ensure_not_blank(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} must not be empty", field));
    }
    Ok(())
}

/// Serialize a reshaped payload as the tool's text output.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> ConnectorResult<String> {
    serde_json::to_string_pretty(value).map_err(ConnectorError::from)
}

type ResourceHandler =
    dyn Fn(Arc<dyn ExecutionContext>) -> BoxFuture<'static, ConnectorResult<String>> + Send + Sync;

pub struct Resource {
    descriptor: ResourceDescriptor,
    handler: Arc<ResourceHandler>,
}

impl Resource {
    pub fn new<F, Fut>(uri: &str, name: &str, description: &str, mime_type: &str, handler: F) -> Self
    where
        F: Fn(Arc<dyn ExecutionContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ConnectorResult<String>> + Send + 'static,
    {
        Self {
            descriptor: ResourceDescriptor {
                uri: uri.to_string(),
                name: name.to_string(),
                description: Some(description.to_string()),
                mime_type: mime_type.to_string(),
            },
            handler: Arc::new(move |context| handler(context).boxed()),
        }
    }

    pub fn uri(&self) -> &str {
        &self.descriptor.uri
    }

    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    pub async fn read(&self, context: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
        (self.handler)(context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ClientRegistry, StaticContext};
    use crate::errors::ErrorKind;

    /// Echo back a greeting.
    #[derive(Debug, Deserialize, JsonSchema)]
    struct GreetInput {
        /// Who to greet
        name: String,
        /// How many times
        #[serde(default = "default_times")]
        times: u64,
    }

    fn default_times() -> u64 {
        1
    }

    impl ToolInput for GreetInput {
        fn validate(&self) -> Result<(), String> {
            ensure_range("times", self.times, 1, 3)
        }
    }

    fn greet_tool() -> Tool {
        Tool::new("greet", "Greets someone", |input: GreetInput, _ctx| async move {
            Ok(vec![format!("hello {}", input.name); input.times as usize].join(" "))
        })
    }

    fn context() -> Arc<dyn ExecutionContext> {
        Arc::new(StaticContext::new(Vec::new(), Arc::new(ClientRegistry::default())))
    }

    #[test]
    fn schema_lists_fields_and_defaults() {
        let schema = greet_tool().definition().input_schema.clone();
        assert!(schema.get("$schema").is_none());
        assert_eq!(schema["properties"]["name"]["type"], "string");
        assert_eq!(schema["properties"]["times"]["default"], 1);
        assert_eq!(schema["required"], serde_json::json!(["name"]));
    }

    #[tokio::test]
    async fn defaults_fill_omitted_arguments() {
        let out = greet_tool()
            .invoke(serde_json::json!({ "name": "ada" }), context())
            .await
            .expect("call should succeed");
        assert_eq!(out, "hello ada");
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_handler() {
        let missing = greet_tool()
            .invoke(Value::Null, context())
            .await
            .expect_err("name is required");
        assert_eq!(missing.kind, ErrorKind::InvalidInput);

        let out_of_range = greet_tool()
            .invoke(serde_json::json!({ "name": "ada", "times": 9 }), context())
            .await
            .expect_err("times is out of range");
        assert_eq!(out_of_range.kind, ErrorKind::InvalidInput);
        assert!(out_of_range.message.contains("between 1 and 3"));
    }
}
