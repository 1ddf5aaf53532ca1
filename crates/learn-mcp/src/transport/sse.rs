//! Decoding of `text/event-stream` response bodies.
//!
//! A Streamable HTTP server may answer a POST with an SSE stream instead of a
//! plain JSON body. The stream can carry keep-alives, progress notifications
//! and the actual response; only the last frame holding a `result` counts.

use serde_json::{json, Value};
use tracing::debug;

/// Collect every `data:` payload of an SSE body and return the last one that
/// carries a `result` member.
///
/// Frames that are not valid JSON are skipped. When no frame has a result the
/// return value is an empty object.
pub fn parse_sse_body(body: &str) -> Value {
    let mut last = json!({});

    for payload in data_payloads(body) {
        match serde_json::from_str::<Value>(payload) {
            Ok(parsed) => {
                if parsed.get("result").is_some() {
                    last = parsed;
                } else {
                    debug!("Skipping SSE frame without result");
                }
            }
            Err(e) => {
                debug!("Skipping malformed SSE frame: {}", e);
            }
        }
    }

    last
}

fn data_payloads(body: &str) -> impl Iterator<Item = &str> {
    body.lines().filter_map(|line| {
        let data = line.strip_prefix("data:")?;
        let data = data.strip_prefix(' ').unwrap_or(data);
        let data = data.trim_end_matches('\r');
        if data.trim().is_empty() {
            None
        } else {
            Some(data)
        }
    })
}
