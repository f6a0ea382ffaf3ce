// HTTP helper - one request per call, status mapped through the shared classifier
use crate::context::{ClientRegistry, ExecutionContext};
use crate::errors::{ConnectorError, ConnectorResult};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: Option<String> },
    Header { name: &'static str, value: String },
}

impl Auth {
    fn material(&self) -> Vec<&str> {
        match self {
            Auth::None => vec![],
            Auth::Bearer(token) => vec![token.as_str()],
            Auth::Basic { username, password } => {
                vec![username.as_str(), password.as_deref().unwrap_or("")]
            }
            Auth::Header { name, value } => vec![*name, value.as_str()],
        }
    }
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl ApiClient {
    /// Build a client for `connector`, reusing the host's registry entry for
    /// the same credential material.
    pub fn connect(
        context: &dyn ExecutionContext,
        connector: &str,
        base_url: &str,
        auth: Auth,
    ) -> ConnectorResult<Self> {
        let key = ClientRegistry::key_for(connector, &auth.material());
        let http = context.clients().client_for(&key)?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request against `path` (relative to the base URL, or absolute).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        };

        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");

        match &self.auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, password.as_deref()),
            Auth::Header { name, value } => builder.header(*name, value),
        }
    }

    pub async fn get_json(
        &self,
        operation: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> ConnectorResult<Value> {
        self.send_json(operation, self.request(Method::GET, path).query(query))
            .await
    }

    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
    ) -> ConnectorResult<Value> {
        self.send_json(operation, self.request(Method::POST, path).json(body))
            .await
    }

    /// Send and parse a JSON response. Empty bodies decode to `Value::Null`.
    pub async fn send_json(&self, operation: &str, request: RequestBuilder) -> ConnectorResult<Value> {
        let response = send(operation, request).await?;
        let status = response.status();

        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::from(e).with_operation(operation))?;

        if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            ConnectorError::parse(format!("unexpected response body: {}", e)).with_operation(operation)
        })
    }
}

/// Issue the request and fail on any non-success status, keeping the body
/// text in the error.
pub async fn send(operation: &str, request: RequestBuilder) -> ConnectorResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ConnectorError::from(e).with_operation(operation))?;

    check_status(operation, response).await
}

pub async fn check_status(operation: &str, response: Response) -> ConnectorResult<Response> {
    let status = response.status();
    debug!(operation = %operation, status = status.as_u16(), "Upstream responded");

    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ConnectorError::from_status(status, &body).with_operation(operation))
}

/// Percent-encode a single path segment supplied by the caller.
pub fn path_segment(value: &str) -> String {
    urlencoding::encode(value.trim()).into_owned()
}
