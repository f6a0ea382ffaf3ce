mod common;

use common::{call, context_for, json_of};
use mcp_connectors::connectors::sonarqube;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{bearer_token, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn search_issues_defaults_to_fifty_unresolved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/search"))
        .and(bearer_token("squ_test"))
        .and(query_param("componentKeys", "my-service"))
        .and(query_param("ps", "50"))
        .and(query_param("p", "1"))
        .and(query_param("resolved", "false"))
        .and(query_param("organization", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paging": { "pageIndex": 1, "pageSize": 50, "total": 1 },
            "issues": [{
                "key": "AX1",
                "rule": "rust:S1481",
                "severity": "MAJOR",
                "type": "CODE_SMELL",
                "message": "Remove this unused variable",
                "component": "my-service:src/lib.rs",
                "line": 12,
                "status": "OPEN"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = sonarqube::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("token", "squ_test")
        .with_setup("base_url", server.uri())
        .with_setup("organization", "acme");

    let body = json_of(&call(&connector, context, "search_issues", json!({ "project_key": "my-service" })).await);

    assert_eq!(body["paging"]["total"], 1);
    assert_eq!(body["issues"][0]["line"], 12);
}

#[tokio::test]
async fn search_projects_defaults_to_one_hundred() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects/search"))
        .and(query_param("ps", "100"))
        .and(query_param_is_missing("organization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paging": { "pageIndex": 1, "pageSize": 100, "total": 1 },
            "components": [{ "key": "my-service", "name": "My Service", "visibility": "private" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = sonarqube::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("token", "squ_test")
        .with_setup("base_url", server.uri());

    let body = json_of(&call(&connector, context, "search_projects", json!({})).await);
    assert_eq!(body["projects"][0]["name"], "My Service");
}

#[tokio::test]
async fn quality_gate_lists_failing_conditions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/qualitygates/project_status"))
        .and(query_param("projectKey", "my-service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectStatus": {
                "status": "ERROR",
                "conditions": [
                    { "status": "OK", "metricKey": "new_bugs", "comparator": "GT", "errorThreshold": "0", "actualValue": "0" },
                    { "status": "ERROR", "metricKey": "new_coverage", "comparator": "LT", "errorThreshold": "80", "actualValue": "61.5" }
                ]
            }
        })))
        .mount(&server)
        .await;

    let connector = sonarqube::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("token", "squ_test")
        .with_setup("base_url", server.uri());

    let body = json_of(&call(&connector, context, "quality_gate_status", json!({ "project_key": "my-service" })).await);

    assert_eq!(body["status"], "ERROR");
    assert_eq!(
        body["failing_conditions"],
        json!([{ "metric": "new_coverage", "comparator": "LT", "threshold": "80", "actual": "61.5" }])
    );
}

#[tokio::test]
async fn unknown_project_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/measures/component"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "errors": [{ "msg": "Component key 'nope' not found" }]
        })))
        .mount(&server)
        .await;

    let connector = sonarqube::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("token", "squ_test")
        .with_setup("base_url", server.uri());

    let output = call(&connector, context, "project_measures", json!({ "project_key": "nope" })).await;

    assert!(output.is_error);
    assert!(
        output
            .text
            .starts_with("sonarqube.project_measures failed while trying to get project measures: HTTP 404 Not Found"),
        "{}",
        output.text
    );
    assert!(output.text.contains("Component key 'nope' not found"));
}

#[tokio::test]
async fn including_resolved_issues_drops_the_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/issues/search"))
        .and(query_param("componentKeys", "my-service"))
        .and(query_param_is_missing("resolved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paging": { "pageIndex": 1, "pageSize": 50, "total": 0 },
            "issues": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = sonarqube::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("token", "squ_test")
        .with_setup("base_url", server.uri());

    let body = json_of(
        &call(
            &connector,
            context,
            "search_issues",
            json!({ "project_key": "my-service", "unresolved": false }),
        )
        .await,
    );

    assert_eq!(body["paging"]["total"], 0);
}
