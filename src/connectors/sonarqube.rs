// SonarQube Connector - projects, quality gates, issues and measures
use super::http::{ApiClient, Auth};
use super::tool::{ensure_not_blank, ensure_range, render_json, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const KEY: &str = "sonarqube";
const DEFAULT_BASE_URL: &str = "https://sonarcloud.io";
const DEFAULT_METRICS: &str = "bugs,vulnerabilities,code_smells,coverage,duplicated_lines_density,ncloc";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("SonarQube", KEY, "1.0.0")
        .logo("https://www.sonarsource.com/favicon.ico")
        .example_prompt("Is the quality gate passing for my-service, and what are its open blocker issues?")
        .credential(
            CredentialField::new("token", "User token", "squ_1234567890abcdef")
                .docs("https://docs.sonarsource.com/sonarqube/latest/user-guide/user-account/generating-and-using-tokens/"),
        )
        .setup(SetupField::string("base_url", "Server URL").default_value(DEFAULT_BASE_URL))
        .setup(SetupField::string("organization", "Organization key (SonarCloud only)"))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("search_projects", "Search projects by name or key", search_projects))
        .tool(Tool::new(
            "quality_gate_status",
            "Get the quality gate status of a project",
            quality_gate_status,
        ))
        .tool(Tool::new("search_issues", "Search issues in a project", search_issues))
        .tool(Tool::new("project_measures", "Get metric values for a project", project_measures))
        .build()
}

struct Sonar {
    api: ApiClient,
    organization: Option<String>,
}

async fn sonar_api(context: &dyn ExecutionContext) -> ConnectorResult<Sonar> {
    let credentials = context.get_credentials().await?;
    let token = credentials.require("token")?;
    let setup = context.get_setup().await?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);
    let organization = setup.str("organization").map(String::from);

    let api = ApiClient::connect(context, KEY, base_url, Auth::Bearer(token.to_string()))?;
    Ok(Sonar { api, organization })
}

impl Sonar {
    fn with_organization(&self, mut query: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        if let Some(org) = &self.organization {
            query.push(("organization", org.clone()));
        }
        query
    }
}

fn paging(body: &Value) -> Value {
    json!({
        "page": body.pointer("/paging/pageIndex"),
        "page_size": body.pointer("/paging/pageSize"),
        "total": body.pointer("/paging/total"),
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchProjectsInput {
    /// Match against project name or key
    pub query: Option<String>,
    /// Page size (1-500)
    #[serde(default = "default_project_page_size")]
    pub page_size: u64,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_project_page_size() -> u64 {
    100
}

fn default_page() -> u64 {
    1
}

impl ToolInput for SearchProjectsInput {
    fn validate(&self) -> Result<(), String> {
        ensure_range("page_size", self.page_size, 1, 500)?;
        ensure_range("page", self.page, 1, 10_000)
    }
}

async fn search_projects(input: SearchProjectsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let sonar = sonar_api(ctx.as_ref()).await?;

    let mut query = vec![("ps", input.page_size.to_string()), ("p", input.page.to_string())];
    if let Some(q) = input.query {
        query.push(("q", q));
    }
    let query = sonar.with_organization(query);

    let body = sonar.api.get_json("search projects", "api/projects/search", &query).await?;

    let projects: Vec<Value> = body["components"]
        .as_array()
        .map(|components| {
            components
                .iter()
                .map(|c| {
                    json!({
                        "key": c["key"],
                        "name": c["name"],
                        "visibility": c["visibility"],
                        "last_analysis": c["lastAnalysisDate"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "projects": projects, "paging": paging(&body) }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectInput {
    /// Project key
    pub project_key: String,
    /// Branch name (defaults to the main branch)
    pub branch: Option<String>,
}

impl ToolInput for ProjectInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("project_key", &self.project_key)
    }
}

async fn quality_gate_status(input: ProjectInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let sonar = sonar_api(ctx.as_ref()).await?;

    let mut query = vec![("projectKey", input.project_key.clone())];
    if let Some(branch) = input.branch {
        query.push(("branch", branch));
    }

    let body = sonar
        .api
        .get_json("get quality gate status", "api/qualitygates/project_status", &query)
        .await?;

    let status = &body["projectStatus"];
    let failing: Vec<Value> = status["conditions"]
        .as_array()
        .map(|conditions| {
            conditions
                .iter()
                .filter(|c| c["status"].as_str() == Some("ERROR"))
                .map(|c| {
                    json!({
                        "metric": c["metricKey"],
                        "comparator": c["comparator"],
                        "threshold": c["errorThreshold"],
                        "actual": c["actualValue"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "project_key": input.project_key,
        "status": status["status"],
        "failing_conditions": failing,
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchIssuesInput {
    /// Project key
    pub project_key: String,
    /// Comma-separated severities (e.g. BLOCKER,CRITICAL)
    pub severities: Option<String>,
    /// Comma-separated types (BUG, VULNERABILITY, CODE_SMELL)
    pub types: Option<String>,
    /// Only unresolved issues; false returns issues in any state
    #[serde(default = "default_unresolved")]
    pub unresolved: bool,
    /// Page size (1-500)
    #[serde(default = "default_issue_page_size")]
    pub page_size: u64,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u64,
}

fn default_unresolved() -> bool {
    true
}

fn default_issue_page_size() -> u64 {
    50
}

impl ToolInput for SearchIssuesInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("project_key", &self.project_key)?;
        ensure_range("page_size", self.page_size, 1, 500)?;
        ensure_range("page", self.page, 1, 10_000)
    }
}

async fn search_issues(input: SearchIssuesInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let sonar = sonar_api(ctx.as_ref()).await?;

    let mut query = vec![
        ("componentKeys", input.project_key),
        ("ps", input.page_size.to_string()),
        ("p", input.page.to_string()),
    ];
    if input.unresolved {
        query.push(("resolved", "false".to_string()));
    }
    if let Some(severities) = input.severities {
        query.push(("severities", severities));
    }
    if let Some(types) = input.types {
        query.push(("types", types));
    }
    let query = sonar.with_organization(query);

    let body = sonar.api.get_json("search issues", "api/issues/search", &query).await?;

    let issues: Vec<Value> = body["issues"]
        .as_array()
        .map(|issues| {
            issues
                .iter()
                .map(|i| {
                    json!({
                        "key": i["key"],
                        "rule": i["rule"],
                        "severity": i["severity"],
                        "type": i["type"],
                        "message": i["message"],
                        "component": i["component"],
                        "line": i["line"],
                        "status": i["status"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "issues": issues, "paging": paging(&body) }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectMeasuresInput {
    /// Project key
    pub project_key: String,
    /// Comma-separated metric keys
    pub metrics: Option<String>,
}

impl ToolInput for ProjectMeasuresInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("project_key", &self.project_key)
    }
}

async fn project_measures(input: ProjectMeasuresInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let sonar = sonar_api(ctx.as_ref()).await?;

    let metrics = input
        .metrics
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_METRICS.to_string());
    let query = vec![("component", input.project_key.clone()), ("metricKeys", metrics)];

    let body = sonar
        .api
        .get_json("get project measures", "api/measures/component", &query)
        .await?;

    let measures: serde_json::Map<String, Value> = body
        .pointer("/component/measures")
        .and_then(Value::as_array)
        .map(|measures| {
            measures
                .iter()
                .filter_map(|m| Some((m["metric"].as_str()?.to_string(), m["value"].clone())))
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "project_key": input.project_key,
        "name": body.pointer("/component/name"),
        "measures": measures,
    }))
}
