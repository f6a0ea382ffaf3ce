use mcp_connectors::{ConnectorManager, McpConfig, McpServer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn server_with(vars: &[(&str, String)]) -> McpServer {
    let config = McpConfig {
        enabled_connectors: Some(vec!["pokeapi".to_string(), "spotify".to_string()]),
        ..McpConfig::default()
    };
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
    let manager = ConnectorManager::from_vars(&config, &vars).expect("manager should build");
    McpServer::new(Arc::new(manager))
}

async fn rpc(server: &McpServer, request: Value) -> Value {
    let response = server
        .handle_message(&request.to_string())
        .await
        .expect("request should get a response");
    serde_json::to_value(response).unwrap()
}

#[tokio::test]
async fn initialize_reports_capabilities() {
    let server = server_with(&[]);

    let response = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "clientInfo": { "name": "test-client", "version": "0.1" } }
        }),
    )
    .await;

    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "mcp-connectors");
}

#[tokio::test]
async fn tools_are_listed_with_qualified_names_and_schemas() {
    let server = server_with(&[]);

    let response = rpc(&server, json!({ "jsonrpc": "2.0", "id": "a", "method": "tools/list" })).await;

    let tools = response["result"]["tools"].as_array().unwrap();
    let search = tools
        .iter()
        .find(|t| t["name"] == "spotify.search")
        .expect("spotify.search is listed");
    assert_eq!(search["inputSchema"]["properties"]["limit"]["default"], 10);
    assert!(tools.iter().all(|t| t["name"].as_str().unwrap().contains('.')));
}

#[tokio::test]
async fn tool_calls_return_text_content() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 25,
            "name": "pikachu",
            "types": [{ "type": { "name": "electric" } }],
            "stats": []
        })))
        .mount(&upstream)
        .await;

    let server = server_with(&[("POKEAPI_BASE_URL", upstream.uri())]);

    let response = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": { "name": "pokeapi.get_pokemon", "arguments": { "name": "pikachu" } }
        }),
    )
    .await;

    let result = &response["result"];
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    let text: Value = serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(text["types"], json!(["electric"]));
}

#[tokio::test]
async fn tool_failures_are_results_not_protocol_errors() {
    let server = server_with(&[]);

    let response = rpc(
        &server,
        json!({
            "jsonrpc": "2.0",
            "id": 8,
            "method": "tools/call",
            "params": { "name": "spotify.list_playlists" }
        }),
    )
    .await;

    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["content"][0]["text"],
        "spotify.list_playlists failed: No access token provided in credentials"
    );
}

#[tokio::test]
async fn protocol_errors_use_jsonrpc_codes() {
    let server = server_with(&[]);

    let unknown_method = rpc(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "prompts/list" })).await;
    assert_eq!(unknown_method["error"]["code"], -32601);

    let unknown_tool = rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": { "name": "slack.post_message" } }),
    )
    .await;
    assert_eq!(unknown_tool["error"]["code"], -32601);

    let missing_params = rpc(&server, json!({ "jsonrpc": "2.0", "id": 3, "method": "tools/call" })).await;
    assert_eq!(missing_params["error"]["code"], -32602);

    let garbage = server.handle_message("{not json").await.expect("parse errors get a response");
    assert_eq!(garbage.error.map(|e| e.code), Some(-32700));
}

#[tokio::test]
async fn notifications_get_no_response() {
    let server = server_with(&[]);

    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;

    assert!(response.is_none());
}

#[tokio::test]
async fn resources_are_listed_and_read() {
    let server = server_with(&[]);

    let listed = rpc(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "resources/list" })).await;
    assert_eq!(
        listed["result"]["resources"],
        json!([{
            "uri": "spotify://player/current",
            "name": "Current playback",
            "description": "Track currently playing on the user's active device",
            "mimeType": "application/json"
        }])
    );

    let read = rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "resources/read", "params": { "uri": "spotify://player/current" } }),
    )
    .await;
    let content = &read["result"]["contents"][0];
    assert_eq!(content["mimeType"], "text/plain");
    assert_eq!(
        content["text"],
        "spotify://player/current failed: No access token provided in credentials"
    );

    let missing = rpc(
        &server,
        json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/read", "params": { "uri": "spotify://nope" } }),
    )
    .await;
    assert_eq!(missing["error"]["code"], -32601);
}

#[tokio::test]
async fn connectors_list_exposes_descriptors() {
    let server = server_with(&[]);

    let response = rpc(&server, json!({ "jsonrpc": "2.0", "id": 1, "method": "connectors/list" })).await;

    let keys: Vec<&str> = response["result"]["connectors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["pokeapi", "spotify"]);
    assert_eq!(
        response["result"]["connectors"][1]["credentials"][0]["name"],
        "access_token"
    );
}
