// Context Schema - declarative descriptions a connector publishes to the host
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Static identity and configuration surface of one connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDescriptor {
    pub name: String,            // "Slack"
    pub key: String,             // "slack" - tool prefix and resource URI scheme
    pub version: String,         // "1.0.0"
    pub logo: String,            // URL
    pub example_prompt: String,
    pub credentials: Vec<CredentialField>,
    pub setup: Vec<SetupField>,
}

impl ConnectorDescriptor {
    pub fn new(name: &str, key: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            version: version.to_string(),
            logo: String::new(),
            example_prompt: String::new(),
            credentials: Vec::new(),
            setup: Vec::new(),
        }
    }

    pub fn logo(mut self, url: &str) -> Self {
        self.logo = url.to_string();
        self
    }

    pub fn example_prompt(mut self, prompt: &str) -> Self {
        self.example_prompt = prompt.to_string();
        self
    }

    pub fn credential(mut self, field: CredentialField) -> Self {
        self.credentials.push(field);
        self
    }

    pub fn setup(mut self, field: SetupField) -> Self {
        self.setup.push(field);
        self
    }
}

/// A secret the host must collect before the connector can call its API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialField {
    pub name: String,
    pub description: String,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    pub required: bool,
}

impl CredentialField {
    pub fn new(name: &str, description: &str, example: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            example: example.to_string(),
            docs_url: None,
            required: true,
        }
    }

    pub fn docs(mut self, url: &str) -> Self {
        self.docs_url = Some(url.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupKind {
    String,
    Integer,
    Boolean,
}

/// A non-secret configuration option with an optional default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupField {
    pub name: String,
    pub description: String,
    pub kind: SetupKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    pub required: bool,
}

impl SetupField {
    pub fn string(name: &str, description: &str) -> Self {
        Self::of_kind(name, description, SetupKind::String)
    }

    pub fn integer(name: &str, description: &str) -> Self {
        Self::of_kind(name, description, SetupKind::Integer)
    }

    pub fn boolean(name: &str, description: &str) -> Self {
        Self::of_kind(name, description, SetupKind::Boolean)
    }

    fn of_kind(name: &str, description: &str, kind: SetupKind) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind,
            default: None,
            required: false,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Resource descriptor for MCP resources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub mime_type: String,
}

/// Resource content
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: String,
    pub text: String,
}
