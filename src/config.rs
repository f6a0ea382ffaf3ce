// MCP Service Configuration
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Stdio,
    Http,
    Both,
}

impl Transport {
    pub fn serves_stdio(&self) -> bool {
        matches!(self, Transport::Stdio | Transport::Both)
    }

    pub fn serves_http(&self) -> bool {
        matches!(self, Transport::Http | Transport::Both)
    }
}

impl FromStr for Transport {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            "both" => Ok(Transport::Both),
            other => bail!("MCP_TRANSPORT must be stdio, http or both, got '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpConfig {
    pub host: String,
    pub port: u16,
    pub transport: Transport,

    /// `None` enables every shipped connector.
    pub enabled_connectors: Option<Vec<String>>,

    pub request_timeout_secs: u64,
    pub log_format: LogFormat,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            transport: Transport::Both,
            enabled_connectors: None,
            request_timeout_secs: 30,
            log_format: LogFormat::Text,
        }
    }
}

impl McpConfig {
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build from an explicit variable map; `from_env` passes the process
    /// environment.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();
        let get = |name: &str| vars.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());

        let port = match get("MCP_PORT") {
            Some(port) => port.parse().with_context(|| format!("MCP_PORT is not a port: '{}'", port))?,
            None => defaults.port,
        };

        let transport = match get("MCP_TRANSPORT") {
            Some(transport) => transport.parse()?,
            None => defaults.transport,
        };

        let enabled_connectors = match get("MCP_CONNECTORS") {
            None => None,
            Some(list) if list.eq_ignore_ascii_case("all") => None,
            Some(list) => Some(
                list.split(',')
                    .map(|key| key.trim().to_ascii_lowercase())
                    .filter(|key| !key.is_empty())
                    .collect(),
            ),
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: '{}'", secs))?,
            None => defaults.request_timeout_secs,
        };

        let log_format = match get("LOG_FORMAT") {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host: get("MCP_HOST").map(String::from).unwrap_or(defaults.host),
            port,
            transport,
            enabled_connectors,
            request_timeout_secs,
            log_format,
        })
    }

    pub fn is_connector_enabled(&self, key: &str) -> bool {
        match &self.enabled_connectors {
            None => true,
            Some(keys) => keys.iter().any(|k| k == key),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
