mod common;

use common::{call, context_for, json_of, read};
use mcp_connectors::connectors::n8n;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn list_workflows_sends_api_key_and_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .and(header("X-N8N-API-KEY", "n8n_test"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "wf1", "name": "Nightly sync", "active": true, "tags": [{ "name": "ops" }] }],
            "nextCursor": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = n8n::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "n8n_test")
        .with_setup("base_url", format!("{}/api/v1", server.uri()));

    let body = json_of(&call(&connector, context, "list_workflows", json!({})).await);

    assert_eq!(body["workflows"][0]["tags"], json!(["ops"]));
    assert_eq!(body["next_cursor"], serde_json::Value::Null);
}

#[tokio::test]
async fn deactivation_posts_to_the_action_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workflows/wf1/deactivate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "wf1", "name": "Nightly sync", "active": false })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = n8n::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "n8n_test")
        .with_setup("base_url", format!("{}/api/v1", server.uri()));

    let body = json_of(
        &call(
            &connector,
            context,
            "set_workflow_active",
            json!({ "workflow_id": "wf1", "active": false }),
        )
        .await,
    );
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn active_workflows_resource_filters_on_active() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/workflows"))
        .and(query_param("active", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "wf1", "name": "Nightly sync", "active": true }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = n8n::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "n8n_test")
        .with_setup("base_url", format!("{}/api/v1", server.uri()));

    let content = read(&connector, context, "n8n://workflows/active").await;
    let body: serde_json::Value = serde_json::from_str(&content.text).unwrap();
    assert_eq!(body["workflows"][0]["id"], "wf1");
}

#[tokio::test]
async fn base_url_has_no_default() {
    let connector = n8n::connector().unwrap();
    let context = context_for(&connector).with_credential("api_key", "n8n_test");

    let output = call(&connector, context, "list_executions", json!({})).await;

    assert!(output.is_error);
    assert_eq!(output.text, "n8n.list_executions failed: No base url provided in setup");
}

#[tokio::test]
async fn execution_status_is_validated() {
    let connector = n8n::connector().unwrap();
    let context = context_for(&connector).with_credential("api_key", "n8n_test");

    let output = call(&connector, context, "list_executions", json!({ "status": "crashed" })).await;

    assert!(output.is_error);
    assert!(output.text.contains("status must be one of success, error, waiting"));
}
