// Client Registry - host-owned HTTP clients keyed by credential-derived keys
use crate::errors::{ConnectorError, ConnectorResult};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("mcp-connectors/", env!("CARGO_PKG_VERSION"));

pub struct ClientRegistry {
    clients: DashMap<String, reqwest::Client>,
    timeout: Duration,
}

impl ClientRegistry {
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            timeout,
        }
    }

    /// Opaque key for a connector and the credential material it uses.
    ///
    /// Secrets never appear in the key itself.
    pub fn key_for(connector: &str, credential_parts: &[&str]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(connector.as_bytes());
        for part in credential_parts {
            hasher.update([0u8]);
            hasher.update(part.as_bytes());
        }
        format!("{}:{:x}", connector, hasher.finalize())
    }

    /// Return the client registered under `key`, building it on first use.
    pub fn client_for(&self, key: &str) -> ConnectorResult<reqwest::Client> {
        if let Some(client) = self.clients.get(key) {
            return Ok(client.clone());
        }

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConnectorError::transport(format!("failed to build HTTP client: {}", e)))?;

        debug!(key = %key.split(':').next().unwrap_or_default(), "Registered HTTP client");

        Ok(self
            .clients
            .entry(key.to_string())
            .or_insert(client)
            .clone())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
