// n8n Connector - workflows and executions on a self-hosted or cloud instance
use super::http::{path_segment, ApiClient, Auth};
use super::tool::{ensure_not_blank, ensure_range, render_json, Resource, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use reqwest::Method;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const KEY: &str = "n8n";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("n8n", KEY, "1.0.0")
        .logo("https://n8n.io/favicon.ico")
        .example_prompt("Which of my n8n workflows failed in the last day?")
        .credential(
            CredentialField::new("api_key", "n8n public API key", "n8n_api_1234567890")
                .docs("https://docs.n8n.io/api/authentication/"),
        )
        .setup(
            SetupField::string("base_url", "Instance API URL (e.g. https://n8n.example.com/api/v1)").required(),
        )
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("list_workflows", "List workflows, optionally only active ones", list_workflows))
        .tool(Tool::new("get_workflow", "Get a workflow with its nodes", get_workflow))
        .tool(Tool::new(
            "set_workflow_active",
            "Activate or deactivate a workflow",
            set_workflow_active,
        ))
        .tool(Tool::new("list_executions", "List recent workflow executions", list_executions))
        .resource(Resource::new(
            "n8n://workflows/active",
            "Active workflows",
            "Workflows currently active on the instance",
            "application/json",
            active_workflows,
        ))
        .build()
}

async fn api(context: &dyn ExecutionContext) -> ConnectorResult<ApiClient> {
    let credentials = context.get_credentials().await?;
    let api_key = credentials.require("api_key")?;
    let setup = context.get_setup().await?;
    let base_url = setup.require_str("base_url")?;

    ApiClient::connect(
        context,
        KEY,
        base_url,
        Auth::Header {
            name: "X-N8N-API-KEY",
            value: api_key.to_string(),
        },
    )
}

fn workflow_summary(workflow: &Value) -> Value {
    json!({
        "id": workflow["id"],
        "name": workflow["name"],
        "active": workflow["active"],
        "updated_at": workflow["updatedAt"],
        "tags": workflow["tags"]
            .as_array()
            .map(|tags| tags.iter().filter_map(|t| t["name"].as_str()).collect::<Vec<_>>())
            .unwrap_or_default(),
    })
}

fn summaries(body: &Value, summarize: fn(&Value) -> Value) -> Vec<Value> {
    body["data"]
        .as_array()
        .map(|items| items.iter().map(summarize).collect())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListWorkflowsInput {
    /// Only return active (true) or inactive (false) workflows
    pub active: Option<bool>,
    /// Page size (1-250)
    #[serde(default = "default_workflow_limit")]
    pub limit: u64,
    /// Cursor returned by a previous call
    pub cursor: Option<String>,
}

fn default_workflow_limit() -> u64 {
    50
}

impl ToolInput for ListWorkflowsInput {
    fn validate(&self) -> Result<(), String> {
        ensure_range("limit", self.limit, 1, 250)
    }
}

async fn fetch_workflows(api: &ApiClient, input: ListWorkflowsInput) -> ConnectorResult<Value> {
    let mut query = vec![("limit", input.limit.to_string())];
    if let Some(active) = input.active {
        query.push(("active", active.to_string()));
    }
    if let Some(cursor) = input.cursor {
        query.push(("cursor", cursor));
    }

    let body = api.get_json("list workflows", "workflows", &query).await?;

    Ok(json!({
        "workflows": summaries(&body, workflow_summary),
        "next_cursor": body["nextCursor"],
    }))
}

async fn list_workflows(input: ListWorkflowsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    render_json(&fetch_workflows(&api, input).await?)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct WorkflowIdInput {
    /// Workflow ID
    pub workflow_id: String,
}

impl ToolInput for WorkflowIdInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("workflow_id", &self.workflow_id)
    }
}

async fn get_workflow(input: WorkflowIdInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let path = format!("workflows/{}", path_segment(&input.workflow_id));

    let workflow = api.get_json("get workflow", &path, &[]).await?;

    let nodes: Vec<Value> = workflow["nodes"]
        .as_array()
        .map(|nodes| {
            nodes
                .iter()
                .map(|n| json!({ "name": n["name"], "type": n["type"], "disabled": n["disabled"].as_bool().unwrap_or(false) }))
                .collect()
        })
        .unwrap_or_default();

    let mut summary = workflow_summary(&workflow);
    summary["created_at"] = workflow["createdAt"].clone();
    summary["nodes"] = Value::Array(nodes);
    render_json(&summary)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetWorkflowActiveInput {
    /// Workflow ID
    pub workflow_id: String,
    /// true to activate, false to deactivate
    pub active: bool,
}

impl ToolInput for SetWorkflowActiveInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("workflow_id", &self.workflow_id)
    }
}

async fn set_workflow_active(input: SetWorkflowActiveInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let (action, operation) = if input.active {
        ("activate", "activate workflow")
    } else {
        ("deactivate", "deactivate workflow")
    };
    let path = format!("workflows/{}/{}", path_segment(&input.workflow_id), action);

    let workflow = api.send_json(operation, api.request(Method::POST, &path)).await?;
    render_json(&workflow_summary(&workflow))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListExecutionsInput {
    /// Restrict to one workflow
    pub workflow_id: Option<String>,
    /// Filter by status: success, error or waiting
    pub status: Option<String>,
    /// Page size (1-250)
    #[serde(default = "default_execution_limit")]
    pub limit: u64,
    /// Cursor returned by a previous call
    pub cursor: Option<String>,
}

fn default_execution_limit() -> u64 {
    20
}

impl ToolInput for ListExecutionsInput {
    fn validate(&self) -> Result<(), String> {
        if let Some(status) = &self.status {
            if !matches!(status.as_str(), "success" | "error" | "waiting") {
                return Err(format!("status must be one of success, error, waiting, got '{}'", status));
            }
        }
        ensure_range("limit", self.limit, 1, 250)
    }
}

fn execution_summary(execution: &Value) -> Value {
    json!({
        "id": execution["id"],
        "workflow_id": execution["workflowId"],
        "status": execution["status"],
        "mode": execution["mode"],
        "finished": execution["finished"],
        "started_at": execution["startedAt"],
        "stopped_at": execution["stoppedAt"],
    })
}

async fn list_executions(input: ListExecutionsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let mut query = vec![("limit", input.limit.to_string())];
    if let Some(workflow_id) = input.workflow_id {
        query.push(("workflowId", workflow_id));
    }
    if let Some(status) = input.status {
        query.push(("status", status));
    }
    if let Some(cursor) = input.cursor {
        query.push(("cursor", cursor));
    }

    let body = api.get_json("list executions", "executions", &query).await?;

    render_json(&json!({
        "executions": summaries(&body, execution_summary),
        "next_cursor": body["nextCursor"],
    }))
}

async fn active_workflows(ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let listed = fetch_workflows(
        &api,
        ListWorkflowsInput {
            active: Some(true),
            limit: 250,
            cursor: None,
        },
    )
    .await?;

    render_json(&listed)
}
