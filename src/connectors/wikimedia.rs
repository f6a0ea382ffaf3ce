//! Wikimedia EventStreams Connector.
//!
//! Reads a bounded batch of events from a public SSE stream and returns the
//! parsed payloads. The connection is closed as soon as the batch is full.

use super::http::{path_segment, ApiClient, Auth};
use super::sse::{self, SseEvent};
use super::tool::{ensure_range, render_json, Tool, ToolInput};
use super::Connector;
use crate::context::{ConnectorDescriptor, ExecutionContext, SetupField};
use crate::errors::{ConnectorResult, McpResult};
use reqwest::Method;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const KEY: &str = "wikimedia";
const DEFAULT_BASE_URL: &str = "https://stream.wikimedia.org/v2/stream";

pub fn descriptor() -> ConnectorDescriptor {
    ConnectorDescriptor::new("Wikimedia EventStreams", KEY, "1.0.0")
        .logo("https://www.wikimedia.org/static/favicon/wmf.ico")
        .example_prompt("Show me the last few edits happening on English Wikipedia")
        .setup(SetupField::string("base_url", "EventStreams base URL").default_value(DEFAULT_BASE_URL))
}

pub fn connector() -> McpResult<Connector> {
    Connector::builder(descriptor())
        .tool(Tool::new(
            "read_events",
            "Read a bounded batch of live events from a Wikimedia stream",
            read_events,
        ))
        .build()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReadEventsInput {
    /// Stream name (e.g. recentchange, page-create, revision-create)
    #[serde(default = "default_stream")]
    pub stream: String,
    /// Stop after this many matching events (1-100)
    #[serde(default = "default_max_events")]
    pub max_events: u64,
    /// Give up after this many milliseconds (100-60000)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Only keep events from this wiki (e.g. enwiki)
    pub wiki: Option<String>,
}

fn default_stream() -> String {
    "recentchange".to_string()
}

fn default_max_events() -> u64 {
    10
}

fn default_timeout_ms() -> u64 {
    5000
}

impl ToolInput for ReadEventsInput {
    fn validate(&self) -> Result<(), String> {
        if self.stream.is_empty() || !self.stream.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.') {
            return Err(format!("invalid stream name '{}'", self.stream));
        }
        ensure_range("max_events", self.max_events, 1, 100)?;
        ensure_range("timeout_ms", self.timeout_ms, 100, 60_000)
    }
}

/// Keep the fields worth reading from a recentchange-style payload; other
/// streams come through unchanged.
fn curate(payload: Value) -> Value {
    if payload.get("title").is_none() || payload.get("wiki").is_none() {
        return payload;
    }

    json!({
        "id": payload["id"],
        "type": payload["type"],
        "wiki": payload["wiki"],
        "title": payload["title"],
        "user": payload["user"],
        "comment": payload["comment"],
        "bot": payload["bot"],
        "timestamp": payload["timestamp"],
        "url": payload.pointer("/meta/uri"),
        "length": {
            "old": payload.pointer("/length/old"),
            "new": payload.pointer("/length/new"),
        },
    })
}

/// A JSON payload from the requested wiki, or from any wiki without a filter.
fn is_usable(event: &SseEvent, wiki: Option<&str>) -> bool {
    match serde_json::from_str::<Value>(&event.data) {
        Ok(payload) => wiki.map_or(true, |wiki| payload["wiki"].as_str() == Some(wiki)),
        Err(e) => {
            debug!(id = %event.id, error = %e, "Skipping non-JSON event");
            false
        }
    }
}

fn parse_events(events: Vec<SseEvent>, wiki: Option<&str>) -> Vec<Value> {
    events
        .into_iter()
        .filter_map(|event| serde_json::from_str::<Value>(&event.data).ok())
        .filter(|payload| match wiki {
            Some(wiki) => payload["wiki"].as_str() == Some(wiki),
            None => true,
        })
        .map(curate)
        .collect()
}

async fn read_events(input: ReadEventsInput, ctx: Arc<dyn ExecutionContext>) -> ConnectorResult<String> {
    let setup = ctx.get_setup().await?;
    let base_url = setup.str("base_url").unwrap_or(DEFAULT_BASE_URL);
    let api = ApiClient::connect(ctx.as_ref(), KEY, base_url, Auth::None)?;

    let request = api.request(Method::GET, &path_segment(&input.stream));
    let max_events = input.max_events as usize;
    let timeout = Duration::from_millis(input.timeout_ms);

    let wiki = input.wiki.clone();
    let batch = sse::read_matching("read events", request, max_events, timeout, move |event| {
        is_usable(event, wiki.as_deref())
    })
    .await?;

    let events = parse_events(batch.events, input.wiki.as_deref());
    let timed_out = batch.timed_out;
    render_json(&json!({
        "stream": input.stream,
        "count": events.len(),
        "timed_out": timed_out,
        "events": events,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(data: &str) -> SseEvent {
        SseEvent {
            event: "message".to_string(),
            id: String::new(),
            data: data.to_string(),
        }
    }

    #[test]
    fn wiki_filter_and_curation() {
        let events = vec![
            event(r#"{"wiki":"enwiki","title":"Rust","user":"a","meta":{"uri":"https://en.wikipedia.org/wiki/Rust"}}"#),
            event(r#"{"wiki":"dewiki","title":"Rost","user":"b"}"#),
            event("not json"),
        ];

        let parsed = parse_events(events, Some("enwiki"));
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["title"], "Rust");
        assert_eq!(parsed[0]["url"], "https://en.wikipedia.org/wiki/Rust");
    }

    #[test]
    fn only_json_events_are_usable() {
        assert!(!is_usable(&event(":heartbeat"), None));
        assert!(is_usable(&event(r#"{"wiki":"dewiki"}"#), None));
        assert!(!is_usable(&event(r#"{"wiki":"dewiki"}"#), Some("enwiki")));
    }

    #[test]
    fn stream_names_are_restricted() {
        let input = ReadEventsInput {
            stream: "../admin".to_string(),
            max_events: 1,
            timeout_ms: 1000,
            wiki: None,
        };
        assert!(input.validate().is_err());
    }
}
