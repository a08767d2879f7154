use std::fmt::Display;
use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use log::{trace, warn};
use redraft_core_types::StreamFrame;
use serde_json::Value;

use crate::sse::DONE_SENTINEL;

const FRAME_KINDS: &[&str] = &[
    "conversation",
    "cleanup_markers",
    "analysis_complete",
    "rewrite_chunk",
    "rewrite_complete",
    "analysis_progress",
    "change_analysis_complete",
    "error",
    "done",
];

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("SSE stream error: {0}")]
    Stream(String),
    #[error("malformed frame: {0}, data: {1}")]
    Malformed(serde_json::Error, String),
    #[error("SSE stream closed before [DONE]")]
    UnexpectedEof,
}

type EventStream<'a> = Pin<
    Box<dyn Stream<Item = Result<eventsource_stream::Event, String>> + Send + 'a>,
>;

/// Decodes an SSE body into frames.
///
/// The returned stream ends after `Done`. A body that closes without the
/// `[DONE]` sentinel yields `UnexpectedEof` last. Frames of a kind this
/// client does not know are skipped.
pub fn decode_frames<'a, S, B, E>(
    body: S,
) -> impl Stream<Item = Result<StreamFrame, TransportError>> + Send + 'a
where
    S: Stream<Item = Result<B, E>> + Send + 'a,
    B: AsRef<[u8]> + Send + 'a,
    E: Display + Send + 'a,
{
    let events: EventStream<'a> = Box::pin(
        body.eventsource()
            .map(|event| event.map_err(|e| e.to_string())),
    );

    futures::stream::unfold(Some(events), |state| async move {
        let mut events = state?;
        loop {
            let event = match events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => return Some((Err(TransportError::Stream(e)), None)),
                None => return Some((Err(TransportError::UnexpectedEof), None)),
            };

            trace!("SSE frame: {:?}", event.data);
            if event.data.is_empty() {
                continue;
            }
            if event.data == DONE_SENTINEL {
                return Some((Ok(StreamFrame::Done), None));
            }

            match serde_json::from_str::<StreamFrame>(&event.data) {
                Ok(StreamFrame::Done) => return Some((Ok(StreamFrame::Done), None)),
                Ok(frame) => return Some((Ok(frame), Some(events))),
                Err(e) => {
                    if let Some(kind) = unknown_kind(&event.data) {
                        warn!("Skipping unknown frame type: {}", kind);
                        continue;
                    }
                    return Some((Err(TransportError::Malformed(e, event.data)), None));
                }
            }
        }
    })
}

fn unknown_kind(data: &str) -> Option<String> {
    let value: Value = serde_json::from_str(data).ok()?;
    let kind = value.get("type")?.as_str()?;
    (!FRAME_KINDS.contains(&kind)).then(|| kind.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    async fn collect(chunks: Vec<&'static str>) -> Vec<Result<StreamFrame, TransportError>> {
        let body = futures::stream::iter(chunks.into_iter().map(Ok::<_, Infallible>));
        decode_frames(body).collect().await
    }

    #[tokio::test]
    async fn reassembles_lines_split_across_chunks() {
        let frames = collect(vec![
            "data: {\"type\":\"conv",
            "ersation\",\"content\":\"Hel",
            "lo\"}\n",
            "\ndata: [DO",
            "NE]\n\n",
        ])
        .await;

        assert_eq!(frames.len(), 2);
        assert_eq!(
            frames[0].as_ref().unwrap(),
            &StreamFrame::conversation("Hello")
        );
        assert_eq!(frames[1].as_ref().unwrap(), &StreamFrame::Done);
    }

    #[tokio::test]
    async fn stops_at_done() {
        let frames = collect(vec![
            "data: [DONE]\n\n",
            "data: {\"type\":\"conversation\",\"content\":\"late\"}\n\n",
        ])
        .await;
        assert_eq!(frames.len(), 1);
        assert!(frames[0].as_ref().unwrap().is_terminal());
    }

    #[tokio::test]
    async fn skips_unknown_frame_kinds() {
        let frames = collect(vec![
            "data: {\"type\":\"heartbeat\"}\n\n",
            "data: {\"type\":\"rewrite_chunk\",\"content\":\"x\"}\n\n",
            "data: [DONE]\n\n",
        ])
        .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap(), &StreamFrame::rewrite_chunk("x"));
    }

    #[tokio::test]
    async fn truncated_body_reports_eof() {
        let frames = collect(vec!["data: {\"type\":\"conversation\",\"content\":\"a\"}\n\n"]).await;
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[1], Err(TransportError::UnexpectedEof)));
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let frames = collect(vec!["data: {not json}\n\n"]).await;
        assert_eq!(frames.len(), 1);
        assert!(matches!(frames[0], Err(TransportError::Malformed(_, _))));
    }
}
