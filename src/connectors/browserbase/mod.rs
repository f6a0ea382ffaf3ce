//! Browserbase Connector - hosted browser sessions.
//!
//! Session lifecycle calls go to the Browserbase REST API; `plan_form_fill`
//! runs the local form-fill interpreter against a page snapshot.

pub mod form_fill;

use super::http::{path_segment, ApiClient, Auth};
use super::tool::{ensure_not_blank, ensure_range, render_json, Resource, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use form_fill::{FormElement, LookupRule};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const KEY: &str = "browserbase";
const DEFAULT_BASE_URL: &str = "https://api.browserbase.com/v1";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("Browserbase", KEY, "1.0.0")
        .logo("https://www.browserbase.com/favicon.ico")
        .example_prompt("Start a browser session in us-west-2 and give me the live view link")
        .credential(
            CredentialField::new("api_key", "Browserbase API key", "bb_live_1234567890")
                .docs("https://docs.browserbase.com/reference/api/authentication"),
        )
        .setup(SetupField::string("project_id", "Project that owns new sessions").required())
        .setup(SetupField::string("base_url", "Browserbase API base URL").default_value(DEFAULT_BASE_URL))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("create_session", "Create a new browser session", create_session))
        .tool(Tool::new("get_session", "Get the status of a browser session", get_session))
        .tool(Tool::new("end_session", "Request release of a running session", end_session))
        .tool(Tool::new(
            "get_live_view",
            "Get debugger and live view URLs for a running session",
            get_live_view,
        ))
        .tool(Tool::new(
            "plan_form_fill",
            "Match values to form controls from a page snapshot and return CSS selectors to fill",
            plan_form_fill,
        ))
        .resource(Resource::new(
            "browserbase://sessions/running",
            "Running sessions",
            "Browser sessions currently running in the project",
            "application/json",
            running_sessions,
        ))
        .build()
}

struct Session {
    api: ApiClient,
    project_id: String,
}

async fn session_api(context: &dyn ExecutionContext) -> ConnectorResult<Session> {
    let credentials = context.get_credentials().await?;
    let api_key = credentials.require("api_key")?;
    let setup = context.get_setup().await?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);
    let project_id = setup.require_str("project_id")?.to_string();

    let api = ApiClient::connect(
        context,
        KEY,
        base_url,
        Auth::Header {
            name: "X-BB-API-Key",
            value: api_key.to_string(),
        },
    )?;

    Ok(Session { api, project_id })
}

fn session_summary(session: &Value) -> Value {
    json!({
        "id": session["id"],
        "status": session["status"],
        "region": session["region"],
        "created_at": session["createdAt"],
        "expires_at": session["expiresAt"],
        "keep_alive": session["keepAlive"],
        "connect_url": session["connectUrl"],
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateSessionInput {
    /// Region to run the browser in (e.g. us-west-2)
    pub region: Option<String>,
    /// Keep the session alive after the client disconnects
    #[serde(default)]
    pub keep_alive: bool,
    /// Session timeout in seconds (60-21600)
    pub timeout: Option<u64>,
}

impl ToolInput for CreateSessionInput {
    fn validate(&self) -> Result<(), String> {
        match self.timeout {
            Some(t) => ensure_range("timeout", t, 60, 21600),
            None => Ok(()),
        }
    }
}

async fn create_session(input: CreateSessionInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let session = session_api(ctx.as_ref()).await?;

    let mut body = json!({
        "projectId": session.project_id,
        "keepAlive": input.keep_alive,
    });
    if let Some(region) = input.region {
        body["region"] = Value::String(region);
    }
    if let Some(timeout) = input.timeout {
        body["timeout"] = json!(timeout);
    }

    let created = session.api.post_json("create session", "sessions", &body).await?;
    render_json(&session_summary(&created))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionIdInput {
    /// Session ID returned by create_session
    pub session_id: String,
}

impl ToolInput for SessionIdInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("session_id", &self.session_id)
    }
}

async fn get_session(input: SessionIdInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let session = session_api(ctx.as_ref()).await?;
    let path = format!("sessions/{}", path_segment(&input.session_id));

    let found = session.api.get_json("get session", &path, &[]).await?;
    render_json(&session_summary(&found))
}

async fn end_session(input: SessionIdInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let session = session_api(ctx.as_ref()).await?;
    let path = format!("sessions/{}", path_segment(&input.session_id));

    let body = json!({
        "projectId": session.project_id,
        "status": "REQUEST_RELEASE",
    });
    let updated = session.api.post_json("end session", &path, &body).await?;
    render_json(&session_summary(&updated))
}

async fn get_live_view(input: SessionIdInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let session = session_api(ctx.as_ref()).await?;
    let path = format!("sessions/{}/debug", path_segment(&input.session_id));

    let debug = session.api.get_json("get live view", &path, &[]).await?;

    let pages: Vec<Value> = debug["pages"]
        .as_array()
        .map(|pages| {
            pages
                .iter()
                .map(|p| {
                    json!({
                        "id": p["id"],
                        "title": p["title"],
                        "url": p["url"],
                        "live_view_url": p["debuggerFullscreenUrl"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "session_id": input.session_id,
        "live_view_url": debug["debuggerFullscreenUrl"],
        "debugger_url": debug["debuggerUrl"],
        "ws_url": debug["wsUrl"],
        "pages": pages,
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlanFormFillInput {
    /// Form controls captured from the page
    pub elements: Vec<FormElement>,
    /// Values to enter, keyed by logical field name (e.g. email, first_name)
    pub data: BTreeMap<String, String>,
    /// Lookup rules to try, in order. Defaults to id, name, autocomplete,
    /// aria_label, label, placeholder, input_type.
    pub rules: Option<Vec<LookupRule>>,
}

impl ToolInput for PlanFormFillInput {
    fn validate(&self) -> Result<(), String> {
        if self.data.is_empty() {
            return Err("data must contain at least one field".to_string());
        }
        if matches!(&self.rules, Some(rules) if rules.is_empty()) {
            return Err("rules must not be empty when provided".to_string());
        }
        Ok(())
    }
}

async fn plan_form_fill(input: PlanFormFillInput, _ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let rules = input.rules.unwrap_or_else(|| LookupRule::DEFAULT_ORDER.to_vec());
    let plan = form_fill::plan(&input.elements, &input.data, &rules);
    render_json(&plan)
}

async fn running_sessions(ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let session = session_api(ctx.as_ref()).await?;

    let listed = session
        .api
        .get_json("list running sessions", "sessions", &[("status", "RUNNING".to_string())])
        .await?;

    let sessions: Vec<Value> = listed
        .as_array()
        .map(|items| items.iter().map(session_summary).collect())
        .unwrap_or_default();

    render_json(&json!({ "sessions": sessions, "count": sessions.len() }))
}
