mod common;

use common::{call, context_for, json_of};
use mcp_connectors::connectors::bamboohr;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{basic_auth, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn directory_uses_subdomain_and_basic_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/v1/employees/directory"))
        .and(basic_auth("key123", "x"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "employees": [
                { "id": "1", "displayName": "Ada Lovelace", "jobTitle": "Engineer", "department": "R&D" },
                { "id": "2", "displayName": "Grace Hopper", "jobTitle": "Admiral", "department": "Navy" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = bamboohr::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "key123")
        .with_setup("subdomain", "acme")
        .with_setup("base_url", server.uri());

    let body = json_of(&call(&connector, context, "employee_directory", json!({ "department": "r&d" })).await);

    assert_eq!(body["count"], 1);
    assert_eq!(body["employees"][0]["name"], "Ada Lovelace");
}

#[tokio::test]
async fn whos_out_passes_the_date_window() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/v1/time_off/whos_out"))
        .and(query_param("start", "2024-07-01"))
        .and(query_param("end", "2024-07-31"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "type": "timeOff", "employeeId": 1, "name": "Ada Lovelace", "start": "2024-07-03", "end": "2024-07-05" },
            { "type": "holiday", "name": "Independence Day", "start": "2024-07-04", "end": "2024-07-04" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let connector = bamboohr::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "key123")
        .with_setup("subdomain", "acme")
        .with_setup("base_url", server.uri());

    let body = json_of(
        &call(
            &connector,
            context,
            "whos_out",
            json!({ "start": "2024-07-01", "end": "2024-07-31" }),
        )
        .await,
    );

    assert_eq!(body["count"], 2);
    assert_eq!(body["out"][1]["kind"], "holiday");
}

#[tokio::test]
async fn time_off_requests_filter_by_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acme/v1/time_off/requests"))
        .and(query_param("start", "2024-07-01"))
        .and(query_param("end", "2024-07-31"))
        .and(query_param("status", "approved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "10",
            "employeeId": "1",
            "name": "Ada Lovelace",
            "status": { "status": "approved" },
            "type": { "name": "Vacation" },
            "start": "2024-07-03",
            "end": "2024-07-05",
            "amount": { "unit": "days", "amount": "3" }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let connector = bamboohr::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "key123")
        .with_setup("subdomain", "acme")
        .with_setup("base_url", server.uri());

    let body = json_of(
        &call(
            &connector,
            context,
            "time_off_requests",
            json!({ "start": "2024-07-01", "end": "2024-07-31", "status": "approved" }),
        )
        .await,
    );

    assert_eq!(body["requests"][0]["type"], "Vacation");
    assert_eq!(body["requests"][0]["status"], "approved");
}

#[tokio::test]
async fn subdomain_is_required() {
    let connector = bamboohr::connector().unwrap();
    let context = context_for(&connector).with_credential("api_key", "key123");

    let output = call(&connector, context, "get_employee", json!({ "employee_id": "1" })).await;

    assert!(output.is_error);
    assert_eq!(output.text, "bamboohr.get_employee failed: No subdomain provided in setup");
}

#[tokio::test]
async fn whos_out_with_unreachable_default_end_returns_error_text() {
    let connector = bamboohr::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "key123")
        .with_setup("subdomain", "acme");

    let output = call(&connector, context, "whos_out", json!({ "start": "+262142-12-31" })).await;

    assert!(output.is_error);
    assert_eq!(
        output.text,
        "bamboohr.whos_out failed: start +262142-12-31 is out of range"
    );
}
