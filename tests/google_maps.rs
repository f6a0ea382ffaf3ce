mod common;

use common::{call, context_for, json_of};
use mcp_connectors::connectors::google_maps;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn text_search_sends_key_field_mask_and_default_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/places:searchText"))
        .and(header("X-Goog-Api-Key", "AIza-test"))
        .and(body_json(json!({ "textQuery": "ramen near union square", "maxResultCount": 5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "places": [{
                "id": "ChIJ1",
                "displayName": { "text": "Ramen Place", "languageCode": "en" },
                "formattedAddress": "1 Post St, San Francisco",
                "location": { "latitude": 37.78, "longitude": -122.4 },
                "rating": 4.5
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = google_maps::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "AIza-test")
        .with_setup("places_base_url", server.uri());

    let body = json_of(&call(&connector, context, "search_places", json!({ "query": "ramen near union square" })).await);

    assert_eq!(body["places"][0]["name"], "Ramen Place");
    assert_eq!(body["places"][0]["latitude"], 37.78);
}

#[tokio::test]
async fn routes_default_to_driving() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/directions/v2:computeRoutes"))
        .and(body_json(json!({
            "origin": { "address": "SFO" },
            "destination": { "address": "Union Square" },
            "travelMode": "DRIVE"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "routes": [{
                "distanceMeters": 21000,
                "duration": "1500s",
                "description": "US-101 N",
                "legs": [{ "steps": [
                    { "navigationInstruction": { "instructions": "Head north" } },
                    { "navigationInstruction": { "instructions": "Merge onto US-101 N" } }
                ] }]
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let connector = google_maps::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "AIza-test")
        .with_setup("routes_base_url", format!("{}/directions/v2", server.uri()));

    let body = json_of(
        &call(
            &connector,
            context,
            "compute_route",
            json!({ "origin": "SFO", "destination": "Union Square" }),
        )
        .await,
    );

    assert_eq!(body["travel_mode"], "DRIVE");
    assert_eq!(body["routes"][0]["duration_seconds"], 1500);
    assert_eq!(body["routes"][0]["steps"], json!(["Head north", "Merge onto US-101 N"]));
}

#[tokio::test]
async fn rate_limits_surface_as_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/places/ChIJ1"))
        .respond_with(ResponseTemplate::new(429).set_body_string("RESOURCE_EXHAUSTED"))
        .mount(&server)
        .await;

    let connector = google_maps::connector().unwrap();
    let context = context_for(&connector)
        .with_credential("api_key", "AIza-test")
        .with_setup("places_base_url", server.uri());

    let output = call(&connector, context, "place_details", json!({ "place_id": "ChIJ1" })).await;

    assert!(output.is_error);
    assert_eq!(
        output.text,
        "google_maps.place_details failed while trying to get place details: HTTP 429 Too Many Requests: RESOURCE_EXHAUSTED"
    );
}
