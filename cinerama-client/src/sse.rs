//! Live seat feed over server-sent events.
//!
//! The backend exposes `GET /seats/stream?showingId=` as a
//! `text/event-stream` topic. Absence of this channel must not break
//! checkout; the subscription reconnects after a configured delay and the
//! rest of the system keeps working off direct hold/release responses in
//! the meantime.

use std::time::Duration;

use async_trait::async_trait;
use cinerama_core::{ApiResult, FeedSubscription, SeatFeed};
use cinerama_shared::SeatChangeEvent;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::http::HttpClient;

pub struct SseSeatFeed {
    http: HttpClient,
    reconnect_delay: Duration,
}

impl SseSeatFeed {
    pub fn new(http: HttpClient, reconnect_delay: Duration) -> Self {
        Self {
            http,
            reconnect_delay,
        }
    }
}

#[async_trait]
impl SeatFeed for SseSeatFeed {
    async fn subscribe(&self, showing_id: Uuid) -> ApiResult<FeedSubscription> {
        let http = self.http.clone();
        let reconnect_delay = self.reconnect_delay;
        let (tx, rx) = mpsc::channel(64);

        let task = tokio::spawn(async move {
            let path = format!("seats/stream?showingId={showing_id}");
            loop {
                match http.get_stream(&path).await {
                    Ok(response) => {
                        pump_stream(response, showing_id, &tx).await;
                    }
                    Err(error) => {
                        tracing::warn!(%showing_id, %error, "seat stream unavailable");
                    }
                }
                if tx.is_closed() {
                    break;
                }
                tokio::time::sleep(reconnect_delay).await;
                tracing::debug!(%showing_id, "reconnecting seat stream");
            }
        });

        Ok(FeedSubscription::from_task(rx, task))
    }
}

/// Forward events from one open stream until it ends or the subscriber
/// goes away
async fn pump_stream(
    response: reqwest::Response,
    showing_id: Uuid,
    tx: &mpsc::Sender<SeatChangeEvent>,
) {
    let mut parser = SseParser::new();
    let mut bytes = response.bytes_stream();

    while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(error) => {
                tracing::warn!(%error, "seat stream interrupted");
                return;
            }
        };
        for payload in parser.push(&String::from_utf8_lossy(&chunk)) {
            match serde_json::from_str::<SeatChangeEvent>(&payload) {
                Ok(event) if event.showing_id == showing_id => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                // Other showings share the topic on some deployments
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed seat event");
                }
            }
        }
    }
}

/// Incremental `text/event-stream` parser. Collects `data:` lines and
/// yields one payload per blank-line-terminated event; comments and other
/// fields are ignored.
struct SseParser {
    pending_line: String,
    data: Vec<String>,
}

impl SseParser {
    fn new() -> Self {
        Self {
            pending_line: String::new(),
            data: Vec::new(),
        }
    }

    fn push(&mut self, chunk: &str) -> Vec<String> {
        let mut payloads = Vec::new();
        for ch in chunk.chars() {
            if ch != '\n' {
                self.pending_line.push(ch);
                continue;
            }
            let line = std::mem::take(&mut self.pending_line);
            let line = line.trim_end_matches('\r');

            if line.is_empty() {
                if !self.data.is_empty() {
                    payloads.push(self.data.join("\n"));
                    self.data.clear();
                }
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
            // `event:`, `id:`, `retry:` and comment lines are ignored
        }
        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_yields_payload_per_event() {
        let mut parser = SseParser::new();
        let payloads = parser.push("event: seat_change\ndata: {\"a\":1}\n\ndata: {\"b\":2}\n\n");
        assert_eq!(payloads, vec!["{\"a\":1}".to_string(), "{\"b\":2}".to_string()]);
    }

    #[test]
    fn test_parser_handles_split_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.push("data: {\"seat").is_empty());
        assert!(parser.push("Id\":3}\n").is_empty());
        let payloads = parser.push("\n");
        assert_eq!(payloads, vec!["{\"seatId\":3}".to_string()]);
    }

    #[test]
    fn test_parser_joins_multiline_data() {
        let mut parser = SseParser::new();
        let payloads = parser.push("data: {\ndata: \"x\": 1}\n\n");
        assert_eq!(payloads, vec!["{\n\"x\": 1}".to_string()]);
    }

    #[test]
    fn test_parser_ignores_comments_and_blank_noise() {
        let mut parser = SseParser::new();
        let payloads = parser.push(": keep-alive\n\n\nretry: 5000\n\n");
        assert!(payloads.is_empty());
    }
}
