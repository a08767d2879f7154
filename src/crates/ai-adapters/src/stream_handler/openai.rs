use crate::types::openai::{
    extract_sse_api_error_message, is_valid_chat_completion_chunk_weak, OpenAISSEData,
};
use crate::types::unified::UnifiedResponse;
use anyhow::{anyhow, Result};
use eventsource_stream::Eventsource;
use futures::StreamExt;
use log::{debug, error, trace, warn};
use reqwest::Response;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

type DeltaSender = mpsc::UnboundedSender<Result<UnifiedResponse>>;

/// What one `data:` payload of the provider stream amounts to.
enum Chunk {
    Done,
    Skip,
    Deltas(Vec<UnifiedResponse>),
}

/// Convert a provider SSE body into unified deltas
///
/// # Arguments
/// * `response` - HTTP response with a `text/event-stream` body
/// * `tx_event` - parsed delta sender; an error is sent once, then the handler returns
/// * `idle_timeout` - maximum wait for the next SSE event
///
/// The body is dropped as soon as the receiving side goes away, even while
/// the provider is silent.
pub async fn handle_openai_stream(response: Response, tx_event: DeltaSender, idle_timeout: Duration) {
    let mut events = response.bytes_stream().eventsource();
    let mut finished = false;

    loop {
        let next = tokio::select! {
            _ = tx_event.closed() => {
                debug!("Completion consumer went away, dropping provider stream");
                return;
            }
            next = timeout(idle_timeout, events.next()) => next,
        };

        let raw = match next {
            Ok(Some(Ok(event))) => event.data,
            Ok(Some(Err(e))) => return fail(&tx_event, format!("Provider stream broke: {}", e)),
            // Some compatible servers close the body after the finish
            // reason without ever sending [DONE].
            Ok(None) if finished => return,
            Ok(None) => return fail(&tx_event, "Provider closed the stream before finishing".to_string()),
            Err(_) => {
                return fail(
                    &tx_event,
                    format!("Provider stream idle timeout after {}s", idle_timeout.as_secs_f32()),
                )
            }
        };
        trace!("OpenAI SSE: {:?}", raw);

        let deltas = match parse_chunk(&raw) {
            Ok(Chunk::Done) => return,
            Ok(Chunk::Skip) => continue,
            Ok(Chunk::Deltas(deltas)) => deltas,
            Err(reason) => return fail(&tx_event, reason),
        };
        for delta in deltas {
            finished |= delta.finish_reason.is_some();
            if tx_event.send(Ok(delta)).is_err() {
                return;
            }
        }
    }
}

fn fail(tx_event: &DeltaSender, reason: String) {
    error!("{}", reason);
    let _ = tx_event.send(Err(anyhow!(reason)));
}

fn parse_chunk(raw: &str) -> std::result::Result<Chunk, String> {
    if raw == "[DONE]" {
        return Ok(Chunk::Done);
    }

    let event_json: Value =
        serde_json::from_str(raw).map_err(|e| format!("Unreadable provider chunk ({}): {}", e, raw))?;

    if let Some(message) = extract_sse_api_error_message(&event_json) {
        return Err(format!("Provider reported an error: {} ({})", message, raw));
    }

    if !is_valid_chat_completion_chunk_weak(&event_json) {
        warn!(
            "Skipping non-standard OpenAI SSE event; object={}",
            event_json
                .get("object")
                .and_then(Value::as_str)
                .unwrap_or("<missing>")
        );
        return Ok(Chunk::Skip);
    }

    let data: OpenAISSEData = serde_json::from_value(event_json)
        .map_err(|e| format!("Unexpected provider chunk shape ({}): {}", e, raw))?;

    let empty_choices = data.is_choices_empty();
    let deltas = data.into_unified_responses();
    if deltas.is_empty() {
        if empty_choices {
            warn!("Ignoring OpenAI SSE chunk with empty choices and no usage payload");
        }
        return Ok(Chunk::Skip);
    }
    Ok(Chunk::Deltas(deltas))
}
