// Error Types - protocol errors for the host surface, connector errors for tool calls
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;
pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid connector declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McpErrorResponse {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl McpError {
    pub fn to_jsonrpc_error(&self) -> McpErrorResponse {
        let code = match self {
            McpError::ToolNotFound(_)
            | McpError::ResourceNotFound(_)
            | McpError::MethodNotFound(_) => -32601,
            McpError::InvalidArguments(_) => -32602,
            McpError::Json(_) => -32700,
            _ => -32603,
        };

        McpErrorResponse {
            code,
            message: self.to_string(),
            data: None,
        }
    }
}

/// Classification of a failed tool or resource invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    MissingCredentials,
    InvalidSetup,
    Unauthorized,
    NotFound,
    Conflict,
    RateLimited,
    Upstream,
    ServerError,
    Transport,
    Timeout,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::MissingCredentials => "missing_credentials",
            ErrorKind::InvalidSetup => "invalid_setup",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::Upstream => "upstream",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Transport => "transport",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Parse => "parse",
        }
    }

    /// True when the failure happened before any request left the process.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidInput | ErrorKind::MissingCredentials | ErrorKind::InvalidSetup
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map an upstream HTTP status onto the shared taxonomy.
pub fn classify_status(status: StatusCode) -> ErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::Unauthorized,
        StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::NotFound,
        StatusCode::CONFLICT => ErrorKind::Conflict,
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorKind::Timeout,
        s if s.is_server_error() => ErrorKind::ServerError,
        _ => ErrorKind::Upstream,
    }
}

/// Map a transport-level reqwest failure onto the shared taxonomy.
pub fn classify_transport(err: &reqwest::Error) -> ErrorKind {
    if err.is_timeout() {
        ErrorKind::Timeout
    } else if err.is_decode() {
        ErrorKind::Parse
    } else if let Some(status) = err.status() {
        classify_status(status)
    } else {
        ErrorKind::Transport
    }
}

/// Map an API-level error code returned inside a 200 response (e.g. Slack's
/// `{"ok": false, "error": "..."}`) onto the shared taxonomy.
pub fn classify_api_code(code: &str) -> ErrorKind {
    match code {
        "not_authed" | "invalid_auth" | "account_inactive" | "token_revoked"
        | "token_expired" | "missing_scope" | "not_allowed_token_type" => ErrorKind::Unauthorized,
        "ratelimited" | "rate_limited" => ErrorKind::RateLimited,
        c if c.ends_with("_not_found") || c == "not_found" => ErrorKind::NotFound,
        "already_reacted" | "name_taken" | "already_exists" => ErrorKind::Conflict,
        c if c.starts_with("invalid_") || c == "no_text" || c == "msg_too_long" => {
            ErrorKind::InvalidInput
        }
        "internal_error" | "fatal_error" | "service_unavailable" => ErrorKind::ServerError,
        _ => ErrorKind::Upstream,
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConnectorError {
    pub kind: ErrorKind,
    pub message: String,
    pub status: Option<u16>,
    pub operation: Option<String>,
}

impl ConnectorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            operation: None,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn missing_credentials(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingCredentials, message)
    }

    pub fn invalid_setup(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSetup, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Upstream answered with a non-success status. The body text is kept
    /// verbatim when present.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        };

        Self {
            kind: classify_status(status),
            message,
            status: Some(status.as_u16()),
            operation: None,
        }
    }

    /// Upstream accepted the request but rejected it at the API level.
    pub fn from_api_code(code: &str) -> Self {
        Self::new(classify_api_code(code), format!("API error: {}", code))
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        if self.operation.is_none() {
            self.operation = Some(operation.into());
        }
        self
    }

    /// Render the failure as the text returned to the host.
    pub fn render(&self, tool: &str) -> String {
        match &self.operation {
            Some(operation) => format!("{} failed while trying to {}: {}", tool, operation, self.message),
            None => format!("{} failed: {}", tool, self.message),
        }
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        let kind = classify_transport(&err);
        let message = match kind {
            ErrorKind::Timeout => format!("request timed out: {}", err),
            ErrorKind::Parse => format!("unexpected response body: {}", err),
            _ => format!("request failed: {}", err),
        };

        Self {
            kind,
            message,
            status: err.status().map(|s| s.as_u16()),
            operation: None,
        }
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("unexpected response body: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_onto_kinds() {
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), ErrorKind::Unauthorized);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), ErrorKind::Unauthorized);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(classify_status(StatusCode::CONFLICT), ErrorKind::Conflict);
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), ErrorKind::RateLimited);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), ErrorKind::ServerError);
        assert_eq!(classify_status(StatusCode::UNPROCESSABLE_ENTITY), ErrorKind::Upstream);
    }

    #[test]
    fn api_codes_map_onto_kinds() {
        assert_eq!(classify_api_code("invalid_auth"), ErrorKind::Unauthorized);
        assert_eq!(classify_api_code("channel_not_found"), ErrorKind::NotFound);
        assert_eq!(classify_api_code("ratelimited"), ErrorKind::RateLimited);
        assert_eq!(classify_api_code("already_reacted"), ErrorKind::Conflict);
        assert_eq!(classify_api_code("invalid_blocks"), ErrorKind::InvalidInput);
        assert_eq!(classify_api_code("something_new"), ErrorKind::Upstream);
    }

    #[test]
    fn upstream_errors_render_status_and_body() {
        let err = ConnectorError::from_status(StatusCode::CONFLICT, "{\"error\":\"busy\"}\n")
            .with_operation("create session");

        assert_eq!(err.status, Some(409));
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(
            err.render("browserbase.create_session"),
            "browserbase.create_session failed while trying to create session: \
             HTTP 409 Conflict: {\"error\":\"busy\"}"
        );
    }

    #[test]
    fn first_operation_label_wins() {
        let err = ConnectorError::transport("connection refused")
            .with_operation("list channels")
            .with_operation("outer");

        assert_eq!(err.operation.as_deref(), Some("list channels"));
        assert!(!err.kind.is_local());
    }

    #[test]
    fn jsonrpc_codes_follow_error_variant() {
        assert_eq!(McpError::ToolNotFound("x".into()).to_jsonrpc_error().code, -32601);
        assert_eq!(McpError::InvalidArguments("x".into()).to_jsonrpc_error().code, -32602);
        assert_eq!(McpError::Internal("x".into()).to_jsonrpc_error().code, -32603);
    }
}
