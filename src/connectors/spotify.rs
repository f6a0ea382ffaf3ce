//! Spotify Connector - catalog search, playback state, playlists and queue.
//!
//! The host supplies a user access token; refreshing it is the host's job.

use super::http::{ApiClient, Auth};
use super::tool::{ensure_not_blank, ensure_range, render_json, Resource, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, CredentialField, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use reqwest::Method;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

pub const KEY: &str = "spotify";
const DEFAULT_BASE_URL: &str = "https://api.spotify.com/v1";
pub const NOTHING_PLAYING: &str = "Nothing is currently playing";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("Spotify", KEY, "1.0.0")
        .logo("https://open.spotify.com/favicon.ico")
        .example_prompt("What song is playing right now? Queue up something similar.")
        .credential(
            CredentialField::new("access_token", "User access token", "BQD1234567890abcdef")
                .docs("https://developer.spotify.com/documentation/web-api/concepts/access-token"),
        )
        .setup(SetupField::string("base_url", "Web API base URL").default_value(DEFAULT_BASE_URL))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new("search", "Search the catalog for tracks, albums, artists or playlists", search))
        .tool(Tool::new(
            "current_playback",
            "Get the track currently playing and the active device",
            current_playback,
        ))
        .tool(Tool::new("list_playlists", "List the user's playlists", list_playlists))
        .tool(Tool::new("add_to_queue", "Add a track or episode to the playback queue", add_to_queue))
        .resource(Resource::new(
            "spotify://player/current",
            "Current playback",
            "Track currently playing on the user's active device",
            "application/json",
            current_playback_resource,
        ))
        .build()
}

async fn api(context: &dyn ExecutionContext) -> ConnectorResult<ApiClient> {
    let credentials = context.get_credentials().await?;
    let token = credentials.require("access_token")?;
    let setup = context.get_setup().await?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);

    ApiClient::connect(context, KEY, base_url, Auth::Bearer(token.to_string()))
}

fn artist_names(item: &Value) -> Vec<&str> {
    item["artists"]
        .as_array()
        .map(|artists| artists.iter().filter_map(|a| a["name"].as_str()).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Track,
    Album,
    Artist,
    Playlist,
}

impl SearchType {
    fn as_str(&self) -> &'static str {
        match self {
            SearchType::Track => "track",
            SearchType::Album => "album",
            SearchType::Artist => "artist",
            SearchType::Playlist => "playlist",
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// Search query (supports field filters like artist:Radiohead)
    pub query: String,
    /// track, album, artist or playlist
    #[serde(default, rename = "type")]
    pub search_type: SearchType,
    /// Maximum results (1-50)
    #[serde(default = "default_search_limit")]
    pub limit: u64,
}

fn default_search_limit() -> u64 {
    10
}

impl ToolInput for SearchInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("query", &self.query)?;
        ensure_range("limit", self.limit, 1, 50)
    }
}

fn search_item(kind: SearchType, item: &Value) -> Value {
    match kind {
        SearchType::Track => json!({
            "name": item["name"],
            "uri": item["uri"],
            "artists": artist_names(item),
            "album": item.pointer("/album/name"),
            "duration_ms": item["duration_ms"],
        }),
        SearchType::Album => json!({
            "name": item["name"],
            "uri": item["uri"],
            "artists": artist_names(item),
            "release_date": item["release_date"],
            "total_tracks": item["total_tracks"],
        }),
        SearchType::Artist => json!({
            "name": item["name"],
            "uri": item["uri"],
            "genres": item["genres"],
            "followers": item.pointer("/followers/total"),
        }),
        SearchType::Playlist => json!({
            "name": item["name"],
            "uri": item["uri"],
            "owner": item.pointer("/owner/display_name"),
            "tracks": item.pointer("/tracks/total"),
        }),
    }
}

async fn search(input: SearchInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    let kind = input.search_type;

    let query = [
        ("q", input.query.clone()),
        ("type", kind.as_str().to_string()),
        ("limit", input.limit.to_string()),
    ];
    let body = api.get_json("search catalog", "search", &query).await?;

    // Results are keyed by the plural of the type: tracks, albums, ...
    let items: Vec<Value> = body
        .pointer(&format!("/{}s/items", kind.as_str()))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter(|i| !i.is_null())
                .map(|i| search_item(kind, i))
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({ "query": input.query, "type": kind, "results": items }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CurrentPlaybackInput {}

impl ToolInput for CurrentPlaybackInput {}

async fn fetch_playback(api: &ApiClient) -> ConnectorResult<String> {
    let body = api.get_json("get current playback", "me/player", &[]).await?;

    if body.is_null() || body["item"].is_null() {
        return Ok(NOTHING_PLAYING.to_string());
    }

    let item = &body["item"];
    render_json(&json!({
        "is_playing": body["is_playing"],
        "progress_ms": body["progress_ms"],
        "track": item["name"],
        "uri": item["uri"],
        "artists": artist_names(item),
        "album": item.pointer("/album/name"),
        "duration_ms": item["duration_ms"],
        "device": body.pointer("/device/name"),
        "shuffle": body["shuffle_state"],
        "repeat": body["repeat_state"],
    }))
}

async fn current_playback(_input: CurrentPlaybackInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    fetch_playback(&api).await
}

async fn current_playback_resource(ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;
    fetch_playback(&api).await
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPlaylistsInput {
    /// Page size (1-50)
    #[serde(default = "default_playlist_limit")]
    pub limit: u64,
    /// Index of the first playlist
    #[serde(default)]
    pub offset: u64,
}

fn default_playlist_limit() -> u64 {
    20
}

impl ToolInput for ListPlaylistsInput {
    fn validate(&self) -> Result<(), String> {
        ensure_range("limit", self.limit, 1, 50)?;
        ensure_range("offset", self.offset, 0, 100_000)
    }
}

async fn list_playlists(input: ListPlaylistsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let query = [("limit", input.limit.to_string()), ("offset", input.offset.to_string())];
    let body = api.get_json("list playlists", "me/playlists", &query).await?;

    let playlists: Vec<Value> = body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|p| {
                    json!({
                        "id": p["id"],
                        "name": p["name"],
                        "uri": p["uri"],
                        "public": p["public"],
                        "owner": p.pointer("/owner/display_name"),
                        "tracks": p.pointer("/tracks/total"),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    render_json(&json!({
        "playlists": playlists,
        "total": body["total"],
        "offset": input.offset,
    }))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AddToQueueInput {
    /// Track or episode URI (spotify:track:...)
    pub uri: String,
    /// Target device ID (defaults to the active device)
    pub device_id: Option<String>,
}

impl ToolInput for AddToQueueInput {
    fn validate(&self) -> Result<(), String> {
        ensure_not_blank("uri", &self.uri)?;
        if !(self.uri.starts_with("spotify:track:") || self.uri.starts_with("spotify:episode:")) {
            return Err(format!("uri must be a spotify:track: or spotify:episode: URI, got '{}'", self.uri));
        }
        Ok(())
    }
}

async fn add_to_queue(input: AddToQueueInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let api = api(ctx.as_ref()).await?;

    let mut query = vec![("uri", input.uri.clone())];
    if let Some(device_id) = input.device_id {
        query.push(("device_id", device_id));
    }

    let request = api.request(Method::POST, "me/player/queue").query(&query);
    api.send_json("add to queue", request).await?;

    Ok(format!("Queued {}", input.uri))
}
