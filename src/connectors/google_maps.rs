// Google Maps Connector - Places (New) text search and details, Routes API
use super::http::{path_segment, ApiClient, Auth};
use super::tool::{ensure_not_blank, ensure_range, render_json, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use reqwest::Method;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const KEY: &str = "google_maps";
const DEFAULT_PLACES_URL: &str = "https://places.googleapis.com/v1";
const DEFAULT_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2";

const SEARCH_FIELDS: &str =
    "places.id,places.displayName,places.formattedAddress,places.location,places.rating,places.userRatingCount,places.primaryType";
const DETAIL_FIELDS: &str = "id,displayName,formattedAddress,location,rating,userRatingCount,primaryType,\
nationalPhoneNumber,websiteUri,googleMapsUri,regularOpeningHours.weekdayDescriptions";
const ROUTE_FIELDS: &str = "routes.duration,routes.distanceMeters,routes.description,routes.legs.steps.navigationInstruction";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("Google Maps", KEY, "1.0.0")
        .logo("https://maps.gstatic.com/mapfiles/api-3/images/google_gray.svg")
        .example_prompt("Find three ramen places near Union Square and how long it takes to drive there from SFO")
        .credential(
            CredentialField::new("api_key", "Google Maps Platform API key", "AIzaSyA-1234567890abcdef")
                .docs("https://developers.google.com/maps/documentation/places/web-service/get-api-key"),
        )
        .setup(SetupField::string("places_base_url", "Places API base URL").default_value(DEFAULT_PLACES_URL))
        .setup(SetupField::string("routes_base_url", "Routes API base URL").default_value(DEFAULT_ROUTES_URL))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("search_places", "Search for places by free-text query", search_places))
        .tool(Tool::new(
            "place_details",
            "Get address, contact details and opening hours for a place",
            place_details,
        ))
        .tool(Tool::new(
            "compute_route",
            "Compute distance and duration between two addresses",
            compute_route,
        ))
        .build()
}

struct Maps {
    api: ApiClient,
    routes_base_url: String,
}

async fn maps_api(context: &dyn ExecutionContext) -> ConnectorResult<Maps> {
    let credentials = context.get_credentials().await?;
    let api_key = credentials.require("api_key")?;
    let setup = context.get_setup().await?;
    let places_base_url = setup.str("places_base_url").unwrap_or(DEFAULT_PLACES_URL);
    let routes_base_url = setup
        .str("routes_base_url")
        .unwrap_or(DEFAULT_ROUTES_URL)
        .trim_end_matches('/')
        .to_string();

    let api = ApiClient::connect(
        context,
        KEY,
        places_base_url,
        Auth::Header {
            name: "X-Goog-Api-Key",
            value: api_key.to_string(),
        },
    )?;

    Ok(Maps { api, routes_base_url })
}

fn place_summary(place: &Value) -> Value {
    json!({
        "id": place["id"],
        "name": place.pointer("/displayName/text"),
        "address": place["formattedAddress"],
        "latitude": place.pointer("/location/latitude"),
        "longitude": place.pointer("/location/longitude"),
        "rating": place["rating"],
        "rating_count": place["userRatingCount"],
        "primary_type": place["primaryType"],
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchPlacesInput {
    /// Free-text query (e.g. "ramen near Union Square")
    pub query: String,
    /// Maximum results (1-20)
    #[serde(default = "default_max_results")]
    pub max_results: u64,
}

fn default_max_results() -> u64 {
    5
}

impl ToolInput for SearchPlacesInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("query", &self.query)?;
        ensure_range("max_results", self.max_results, 1, 20)
    }
}

async fn search_places(input: SearchPlacesInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let maps = maps_api(ctx.as_ref()).await?;
    let operation = "search places";

    let request = maps
        .api
        .request(Method::POST, "places:searchText")
        .header("X-Goog-FieldMask", SEARCH_FIELDS)
        .json(&json!({
            "textQuery": input.query,
            "maxResultCount": input.max_results,
        }));
    let body = maps.api.send_json(operation, request).await?;

    let places: Vec<Value> = body["places"]
        .as_array()
        .map(|places| places.iter().map(place_summary).collect())
        .unwrap_or_default();

    render_json(&json!({ "query": input.query, "places": places }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaceDetailsInput {
    /// Place ID from search_places
    pub place_id: String,
}

impl ToolInput for PlaceDetailsInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("place_id", &self.place_id)
    }
}

async fn place_details(input: PlaceDetailsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let maps = maps_api(ctx.as_ref()).await?;
    let path = format!("places/{}", path_segment(&input.place_id));

    let request = maps
        .api
        .request(Method::GET, &path)
        .header("X-Goog-FieldMask", DETAIL_FIELDS);
    let place = maps.api.send_json("get place details", request).await?;

    let mut details = place_summary(&place);
    details["phone"] = place["nationalPhoneNumber"].clone();
    details["website"] = place["websiteUri"].clone();
    details["maps_url"] = place["googleMapsUri"].clone();
    details["opening_hours"] = place
        .pointer("/regularOpeningHours/weekdayDescriptions")
        .cloned()
        .unwrap_or(Value::Null);

    render_json(&details)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
    TwoWheeler,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ComputeRouteInput {
    /// Starting address or place name
    pub origin: String,
    /// Destination address or place name
    pub destination: String,
    /// DRIVE, WALK, BICYCLE, TRANSIT or TWO_WHEELER
    #[serde(default)]
    pub travel_mode: TravelMode,
}

impl ToolInput for ComputeRouteInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("origin", &self.origin)?;
        ensure_not_blank("destination", &self.destination)
    }
}

/// "1234s" -> 1234
fn duration_seconds(value: &Value) -> Option<u64> {
    value.as_str()?.strip_suffix('s')?.parse().ok()
}

async fn compute_route(input: ComputeRouteInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let maps = maps_api(ctx.as_ref()).await?;
    let url = format!("{}:computeRoutes", maps.routes_base_url);

    let request = maps
        .api
        .request(Method::POST, &url)
        .header("X-Goog-FieldMask", ROUTE_FIELDS)
        .json(&json!({
            "origin": { "address": input.origin },
            "destination": { "address": input.destination },
            "travelMode": input.travel_mode,
        }));
    let body = maps.api.send_json("compute route", request).await?;

    let routes: Vec<Value> = body["routes"]
        .as_array()
        .map(|routes| {
            routes
                .iter()
                .map(|r| {
                    let steps: Vec<&Value> = r["legs"]
                        .as_array()
                        .into_iter()
                        .flatten()
                        .filter_map(|leg| leg["steps"].as_array())
                        .flatten()
                        .filter_map(|step| step.pointer("/navigationInstruction/instructions"))
                        .collect();
                    json!({
                        "description": r["description"],
                        "distance_meters": r["distanceMeters"],
                        "duration_seconds": duration_seconds(&r["duration"]),
                        "steps": steps,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "origin": input.origin,
        "destination": input.destination,
        "travel_mode": input.travel_mode,
        "routes": routes,
    }))
}
