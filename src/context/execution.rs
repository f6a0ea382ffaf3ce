// Execution Context - host-supplied credentials and setup for one invocation
use super::clients::ClientRegistry;
use super::schema::{SetupField, SetupKind};
use crate::errors::{ConnectorError, ConnectorResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Accessor the host hands to every tool and resource handler.
///
/// Values are resolved per call; connectors must not keep them beyond the
/// invocation that requested them.
#[async_trait]
pub trait ExecutionContext: Send + Sync {
    async fn get_credentials(&self) -> ConnectorResult<Credentials>;

    async fn get_setup(&self) -> ConnectorResult<Setup>;

    fn clients(&self) -> &ClientRegistry;
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    values: HashMap<String, String>,
}

impl Credentials {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Fetch a secret or fail with "No <field> provided in credentials".
    pub fn require(&self, field: &str) -> ConnectorResult<&str> {
        self.get(field).ok_or_else(|| {
            ConnectorError::missing_credentials(format!(
                "No {} provided in credentials",
                field.replace('_', " ")
            ))
        })
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Credentials {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Setup values after defaults and type coercion have been applied.
#[derive(Debug, Clone, Default)]
pub struct Setup {
    values: HashMap<String, Value>,
}

impl Setup {
    /// Resolve raw host values against the declared setup fields.
    ///
    /// Values coming from the environment arrive as strings and are coerced
    /// to the declared kind. Unknown keys are dropped.
    pub fn resolve(fields: &[SetupField], raw: &HashMap<String, Value>) -> ConnectorResult<Self> {
        let mut values = HashMap::new();

        for field in fields {
            let supplied = raw.get(&field.name).filter(|v| match v {
                Value::Null => false,
                Value::String(s) => !s.trim().is_empty(),
                _ => true,
            });

            let value = match supplied {
                Some(v) => coerce(field, v)?,
                None => match &field.default {
                    Some(default) => default.clone(),
                    None if field.required => {
                        return Err(ConnectorError::invalid_setup(format!(
                            "No {} provided in setup",
                            field.name.replace('_', " ")
                        )));
                    }
                    None => continue,
                },
            };

            values.insert(field.name.clone(), value);
        }

        Ok(Self { values })
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn require_str(&self, name: &str) -> ConnectorResult<&str> {
        self.str(name).ok_or_else(|| {
            ConnectorError::invalid_setup(format!("No {} provided in setup", name.replace('_', " ")))
        })
    }

    pub fn u64(&self, name: &str) -> Option<u64> {
        self.values.get(name).and_then(Value::as_u64)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.values.get(name).and_then(Value::as_bool)
    }
}

fn coerce(field: &SetupField, value: &Value) -> ConnectorResult<Value> {
    let invalid = || {
        ConnectorError::invalid_setup(format!(
            "Setup field '{}' expects a {:?} value, got {}",
            field.name, field.kind, value
        ))
    };

    match (field.kind, value) {
        (SetupKind::String, Value::String(s)) => Ok(Value::String(s.trim().to_string())),
        (SetupKind::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
        (SetupKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        (SetupKind::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid()),
        (SetupKind::Boolean, Value::Bool(_)) => Ok(value.clone()),
        (SetupKind::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}

/// Host-side context holding values collected ahead of time.
pub struct StaticContext {
    setup_fields: Vec<SetupField>,
    credentials: HashMap<String, String>,
    setup: HashMap<String, Value>,
    clients: Arc<ClientRegistry>,
}

impl StaticContext {
    pub fn new(setup_fields: Vec<SetupField>, clients: Arc<ClientRegistry>) -> Self {
        Self {
            setup_fields,
            credentials: HashMap::new(),
            setup: HashMap::new(),
            clients,
        }
    }

    pub fn with_credential(mut self, name: &str, value: impl Into<String>) -> Self {
        self.credentials.insert(name.to_string(), value.into());
        self
    }

    pub fn with_setup(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.setup.insert(name.to_string(), value.into());
        self
    }
}

#[async_trait]
impl ExecutionContext for StaticContext {
    async fn get_credentials(&self) -> ConnectorResult<Credentials> {
        Ok(Credentials::new(self.credentials.clone()))
    }

    async fn get_setup(&self) -> ConnectorResult<Setup> {
        Setup::resolve(&self.setup_fields, &self.setup)
    }

    fn clients(&self) -> &ClientRegistry {
        &self.clients
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use serde_json::json;

    fn fields() -> Vec<SetupField> {
        vec![
            SetupField::string("base_url", "API base").default_value("https://api.example.com"),
            SetupField::integer("page_size", "Page size").default_value(25),
            SetupField::boolean("verbose", "Verbose output"),
            SetupField::string("workspace", "Workspace").required(),
        ]
    }

    #[test]
    fn defaults_apply_and_strings_are_coerced() {
        let raw = HashMap::from([
            ("workspace".to_string(), json!("acme")),
            ("verbose".to_string(), json!("yes")),
            ("page_size".to_string(), json!("50")),
        ]);

        let setup = Setup::resolve(&fields(), &raw).expect("setup should resolve");
        assert_eq!(setup.str("base_url"), Some("https://api.example.com"));
        assert_eq!(setup.u64("page_size"), Some(50));
        assert_eq!(setup.bool("verbose"), Some(true));
        assert_eq!(setup.str("workspace"), Some("acme"));
    }

    #[test]
    fn missing_required_setup_is_reported() {
        let err = Setup::resolve(&fields(), &HashMap::new()).expect_err("workspace is required");
        assert_eq!(err.kind, ErrorKind::InvalidSetup);
        assert_eq!(err.message, "No workspace provided in setup");
    }

    #[test]
    fn mistyped_setup_is_rejected() {
        let raw = HashMap::from([
            ("workspace".to_string(), json!("acme")),
            ("page_size".to_string(), json!("lots")),
        ]);

        let err = Setup::resolve(&fields(), &raw).expect_err("page_size is not an integer");
        assert_eq!(err.kind, ErrorKind::InvalidSetup);
    }

    #[test]
    fn blank_credentials_count_as_missing() {
        let creds = Credentials::from([("access_token", "  ")]);
        let err = creds.require("access_token").expect_err("blank token");
        assert_eq!(err.kind, ErrorKind::MissingCredentials);
        assert_eq!(err.message, "No access token provided in credentials");
    }
}
