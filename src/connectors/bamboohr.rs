//! BambooHR Connector - employee directory and time off.
//!
//! Requests go to `{base_url}/{subdomain}/v1/...` with the API key as the
//! basic-auth username and a fixed `x` password.

use super::http::{path_segment, ApiClient, Auth};
use super::tool::{ensure_not_blank, render_json, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use chrono::{Duration, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

pub const KEY: &str = "bamboohr";
const DEFAULT_BASE_URL: &str = "https://api.bamboohr.com/api/gateway.php";
const DEFAULT_WINDOW_DAYS: i64 = 30;
const EMPLOYEE_FIELDS: &str =
    "firstName,lastName,displayName,jobTitle,department,division,location,workEmail,mobilePhone,hireDate,supervisor,status";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("BambooHR", KEY, "1.0.0")
        .logo("https://www.bamboohr.com/favicon.ico")
        .example_prompt("Who is out of office next week?")
        .credential(
            CredentialField::new("api_key", "BambooHR API key", "0123456789abcdef0123456789abcdef01234567")
                .docs("https://documentation.bamboohr.com/docs/getting-started"),
        )
        .setup(SetupField::string("subdomain", "Company subdomain (the part before .bamboohr.com)").required())
        .setup(SetupField::string("base_url", "BambooHR API gateway URL").default_value(DEFAULT_BASE_URL))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("employee_directory", "List employees in the company directory", employee_directory))
        .tool(Tool::new("get_employee", "Get profile fields for one employee", get_employee))
        .tool(Tool::new(
            "time_off_requests",
            "List time off requests in a date window",
            time_off_requests,
        ))
        .tool(Tool::new("whos_out", "List who is out in a date window", whos_out))
        .build()
}

async fn api(context: &dyn ExecutionContext) -> ConnectorResult<ApiClient> {
    let credentials = context.get_credentials().await?;
    let api_key = credentials.require("api_key")?;
    let setup = context.get_setup().await?;
    let subdomain = setup.require_str("subdomain")?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);

    ApiClient::connect(
        context,
        KEY,
        &format!("{}/{}/v1", base_url.trim_end_matches('/'), path_segment(subdomain)),
        Auth::Basic {
            username: api_key.to_string(),
            password: Some("x".to_string()),
        },
    )
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DirectoryInput {
    /// Only employees in this department (case-insensitive)
    pub department: Option<String>,
}

impl ToolInput for DirectoryInput {}

async fn employee_directory(input: DirectoryInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let body = api.get_json("fetch employee directory", "employees/directory", &[]).await?;

    let wanted = input.department.as_deref().map(str::to_lowercase);
    let employees: Vec<Value> = body["employees"]
        .as_array()
        .map(|employees| {
            employees
                .iter()
                .filter(|e| match &wanted {
                    Some(dept) => e["department"].as_str().map(str::to_lowercase).as_deref() == Some(dept.as_str()),
                    None => true,
                })
                .map(|e| {
                    json!({
                        "id": e["id"],
                        "name": e["displayName"],
                        "job_title": e["jobTitle"],
                        "department": e["department"],
                        "location": e["location"],
                        "work_email": e["workEmail"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "count": employees.len(), "employees": employees }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct EmployeeInput {
    /// Employee ID, or 0 for the API key's owner
    pub employee_id: String,
    /// Comma-separated field names to fetch instead of the default profile
    pub fields: Option<String>,
}

impl ToolInput for EmployeeInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("employee_id", &self.employee_id)
    }
}

async fn get_employee(input: EmployeeInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let path = format!("employees/{}", path_segment(&input.employee_id));
    let fields = input
        .fields
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| EMPLOYEE_FIELDS.to_string());

    let employee = api.get_json("get employee", &path, &[("fields", fields)]).await?;
    render_json(&employee)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct DateWindowInput {
    /// First day, YYYY-MM-DD (defaults to today)
    pub start: Option<String>,
    /// Last day, YYYY-MM-DD (defaults to 30 days after start)
    pub end: Option<String>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, String> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|_| format!("{} must be a YYYY-MM-DD date, got '{}'", field, v))
        })
        .transpose()
}

impl DateWindowInput {
    fn resolve(&self) -> Result<(NaiveDate, NaiveDate), String> {
        let start = parse_date("start", self.start.as_deref())?.unwrap_or_else(|| Utc::now().date_naive());
        let end = match parse_date("end", self.end.as_deref())? {
            Some(end) => end,
            None => start
                .checked_add_signed(Duration::days(DEFAULT_WINDOW_DAYS))
                .ok_or_else(|| format!("start {} is out of range", start))?,
        };
        if end < start {
            return Err(format!("end {} is before start {}", end, start));
        }
        Ok((start, end))
    }

    /// Only called after `validate`, so the dates are known to parse.
    fn query(&self) -> Vec<(&'static str, String)> {
        let today = Utc::now().date_naive();
        let (start, end) = self.resolve().unwrap_or((today, today));
        vec![
            ("start", start.format("%Y-%m-%d").to_string()),
            ("end", end.format("%Y-%m-%d").to_string()),
        ]
    }
}

impl ToolInput for DateWindowInput {
    fn validate(&self) -> Result<(), String> {
        self.resolve().map(|_| ())
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TimeOffRequestsInput {
    #[serde(flatten)]
    pub window: DateWindowInput,
    /// approved, denied, superceded, requested or canceled
    pub status: Option<String>,
    /// Only requests for this employee
    pub employee_id: Option<String>,
}

impl ToolInput for TimeOffRequestsInput {
    fn validate(&self) -> Result<(), String> {
        if let Some(status) = &self.status {
            if !matches!(
                status.as_str(),
                "approved" | "denied" | "superceded" | "requested" | "canceled"
            ) {
                return Err(format!("unknown status '{}'", status));
            }
        }
        self.window.validate()
    }
}

async fn time_off_requests(input: TimeOffRequestsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let mut query = input.window.query();
    if let Some(status) = input.status {
        query.push(("status", status));
    }
    if let Some(employee_id) = input.employee_id {
        query.push(("employeeId", employee_id));
    }

    let body = api.get_json("list time off requests", "time_off/requests", &query).await?;

    let requests: Vec<Value> = body
        .as_array()
        .map(|requests| {
            requests
                .iter()
                .map(|r| {
                    json!({
                        "id": r["id"],
                        "employee_id": r["employeeId"],
                        "name": r["name"],
                        "status": r.pointer("/status/status"),
                        "type": r.pointer("/type/name"),
                        "start": r["start"],
                        "end": r["end"],
                        "amount": r["amount"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "count": requests.len(), "requests": requests }))
}

async fn whos_out(input: DateWindowInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let body = api.get_json("list who is out", "time_off/whos_out", &input.query()).await?;

    let entries: Vec<Value> = body
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .map(|e| {
                    json!({
                        "kind": e["type"],
                        "employee_id": e["employeeId"],
                        "name": e["name"],
                        "start": e["start"],
                        "end": e["end"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "count": entries.len(), "out": entries }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_defaults_to_thirty_days() {
        let window = DateWindowInput {
            start: Some("2024-02-10".into()),
            end: None,
        };
        let query = window.query();
        assert_eq!(query[0], ("start", "2024-02-10".to_string()));
        assert_eq!(query[1], ("end", "2024-03-11".to_string()));
    }

    #[test]
    fn reversed_window_is_rejected() {
        let window = DateWindowInput {
            start: Some("2024-02-10".into()),
            end: Some("2024-02-01".into()),
        };
        assert!(window.validate().is_err());

        let garbled = DateWindowInput {
            start: Some("next tuesday".into()),
            end: None,
        };
        assert_eq!(
            garbled.validate(),
            Err("start must be a YYYY-MM-DD date, got 'next tuesday'".to_string())
        );
    }

    #[test]
    fn start_near_the_calendar_limit_is_rejected() {
        let window = DateWindowInput {
            start: Some("+262142-12-31".into()),
            end: None,
        };
        assert_eq!(
            window.validate(),
            Err("start +262142-12-31 is out of range".to_string())
        );
        // An explicit end needs no arithmetic.
        let bounded = DateWindowInput {
            start: Some("+262142-12-01".into()),
            end: Some("+262142-12-31".into()),
        };
        assert!(bounded.validate().is_ok());
    }
}
