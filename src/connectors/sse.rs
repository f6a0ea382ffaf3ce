//! Bounded Server-Sent Events reader.
//!
//! Reads until `max_events` data events have arrived, then drops the
//! response so the connection closes. If the deadline passes first the
//! batch comes back empty with `timed_out` set.

use super::http::check_status;
use crate::errors::{ConnectorError, ConnectorResult, ErrorKind};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::RequestBuilder;
use serde::Serialize;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SseEvent {
    pub event: String,
    pub id: String,
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SseBatch {
    pub events: Vec<SseEvent>,
    pub timed_out: bool,
}

pub async fn read_bounded(
    operation: &str,
    request: RequestBuilder,
    max_events: usize,
    timeout: Duration,
) -> ConnectorResult<SseBatch> {
    read_matching(operation, request, max_events, timeout, |_| true).await
}

/// Like [`read_bounded`], but only events accepted by `keep` count toward
/// `max_events`.
pub async fn read_matching<F>(
    operation: &str,
    request: RequestBuilder,
    max_events: usize,
    timeout: Duration,
    keep: F,
) -> ConnectorResult<SseBatch>
where
    F: Fn(&SseEvent) -> bool,
{
    let deadline = Instant::now() + timeout;

    let read = async {
        // `headers` replaces the JSON Accept set by `ApiClient::request`.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));

        let response = request
            .headers(headers)
            .timeout(timeout + Duration::from_secs(1))
            .send()
            .await
            .map_err(|e| ConnectorError::from(e).with_operation(operation))?;
        let response = check_status(operation, response).await?;

        let mut events = Vec::new();
        let mut stream = response.bytes_stream().eventsource();
        while let Some(item) = stream.next().await {
            let event = item.map_err(|e| {
                ConnectorError::parse(format!("malformed event stream: {}", e)).with_operation(operation)
            })?;

            if event.data.trim().is_empty() {
                continue;
            }

            let event = SseEvent {
                event: event.event,
                id: event.id,
                data: event.data,
            };
            if !keep(&event) {
                continue;
            }
            events.push(event);

            if events.len() >= max_events {
                break;
            }
        }

        Ok::<_, ConnectorError>(events)
    };

    match timeout_at(deadline, read).await {
        Ok(Ok(events)) => {
            debug!(operation = %operation, count = events.len(), "Event stream read complete");
            Ok(SseBatch {
                events,
                timed_out: false,
            })
        }
        // Upstream 408/504 answers keep their status and surface as errors.
        Ok(Err(ConnectorError {
            kind: ErrorKind::Timeout,
            status: None,
            ..
        }))
        | Err(_) => {
            debug!(operation = %operation, "Event stream read timed out");
            Ok(SseBatch {
                events: Vec::new(),
                timed_out: true,
            })
        }
        Ok(Err(e)) => Err(e),
    }
}
