use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{debug, error, warn};
use redraft_core_types::StreamFrame;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;

use crate::filter::MarkerFilter;
use crate::markers::MarkerProtocol;

/// A tool the agent ran, with the arguments the model supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub name: String,
    pub arguments: Value,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionEvent {
    Text(String),
    ToolResult(ToolOutcome),
    End,
}

pub type CompletionSource = BoxStream<'static, anyhow::Result<CompletionEvent>>;

/// How one kind of completion is rendered and finalized.
#[async_trait]
pub trait CompletionProtocol: Send {
    /// Protocol name, for logs.
    fn name(&self) -> &'static str;

    /// Markers to hide from visible text. Empty means pass-through.
    fn markers(&self) -> MarkerProtocol {
        MarkerProtocol::none()
    }

    /// Wraps released visible text.
    fn text_frame(&self, content: String) -> StreamFrame;

    fn on_tool_result(&mut self, _outcome: &ToolOutcome) {}

    /// Completion frames for a finished stream. Runs once, after the
    /// source has been released. A `Done` in the result is ignored.
    async fn finalize(&mut self, transcript: &str, seen_markers: &BTreeSet<String>)
        -> Vec<StreamFrame>;

    /// User-facing message for a failed stream.
    fn failure_message(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Completed,
    Failed(String),
    /// The consumer went away; nothing further was sent.
    Abandoned,
}

/// Turns completion events into frames.
///
/// Every stream that is read to the end carries exactly one `Done`, last.
/// A source error or an idle gap longer than `idle_timeout` ends the stream
/// with the protocol's error frame and `Done`.
pub struct CompletionStreamReader<P> {
    protocol: P,
    idle_timeout: Duration,
}

impl<P> CompletionStreamReader<P>
where
    P: CompletionProtocol + 'static,
{
    pub fn new(protocol: P, idle_timeout: Duration) -> Self {
        Self {
            protocol,
            idle_timeout,
        }
    }

    /// Runs the reader on its own task and returns the frame stream.
    pub fn spawn(self, source: CompletionSource, buffer: usize) -> ReceiverStream<StreamFrame> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        tokio::spawn(async move {
            let name = self.protocol.name();
            let outcome = self.run(source, &tx).await;
            debug!("Completion stream finished: protocol={}, outcome={:?}", name, outcome);
        });
        ReceiverStream::new(rx)
    }

    pub async fn run(
        mut self,
        mut source: CompletionSource,
        tx: &mpsc::Sender<StreamFrame>,
    ) -> ReadOutcome {
        let mut filter = MarkerFilter::new(self.protocol.markers());
        let mut transcript = String::new();

        loop {
            let next = tokio::select! {
                _ = tx.closed() => {
                    debug!("Frame consumer dropped, releasing completion source");
                    return ReadOutcome::Abandoned;
                }
                next = timeout(self.idle_timeout, source.next()) => next,
            };

            match next {
                Ok(Some(Ok(CompletionEvent::Text(fragment)))) => {
                    transcript.push_str(&fragment);
                    let visible = filter.push(&fragment);
                    if !visible.is_empty()
                        && tx.send(self.protocol.text_frame(visible)).await.is_err()
                    {
                        return ReadOutcome::Abandoned;
                    }
                }
                Ok(Some(Ok(CompletionEvent::ToolResult(outcome)))) => {
                    debug!(
                        "Tool result in {} stream: tool={}",
                        self.protocol.name(),
                        outcome.name
                    );
                    self.protocol.on_tool_result(&outcome);
                }
                Ok(Some(Ok(CompletionEvent::End))) | Ok(None) => break,
                Ok(Some(Err(e))) => {
                    error!("Completion source failed: {}", e);
                    drop(source);
                    let tail = self.tail_frame(&mut filter);
                    if !send_tail(tx, tail).await {
                        return ReadOutcome::Abandoned;
                    }
                    return fail(tx, self.protocol.failure_message(), e.to_string()).await;
                }
                Err(_) => {
                    let message = format!(
                        "No completion data within {}s",
                        self.idle_timeout.as_secs_f32()
                    );
                    error!("{}", message);
                    drop(source);
                    let tail = self.tail_frame(&mut filter);
                    if !send_tail(tx, tail).await {
                        return ReadOutcome::Abandoned;
                    }
                    return fail(tx, self.protocol.failure_message(), message).await;
                }
            }
        }

        drop(source);

        let tail = self.tail_frame(&mut filter);
        if !send_tail(tx, tail).await {
            return ReadOutcome::Abandoned;
        }

        let frames = self
            .protocol
            .finalize(&transcript, filter.seen_markers())
            .await;
        for frame in frames {
            if frame.is_terminal() {
                warn!("Ignoring Done returned by {} finalize", self.protocol.name());
                continue;
            }
            if tx.send(frame).await.is_err() {
                return ReadOutcome::Abandoned;
            }
        }

        if tx.send(StreamFrame::Done).await.is_err() {
            return ReadOutcome::Abandoned;
        }
        ReadOutcome::Completed
    }

    /// Visible text the filter was still holding back.
    fn tail_frame(&self, filter: &mut MarkerFilter) -> Option<StreamFrame> {
        let tail = filter.finish();
        (!tail.is_empty()).then(|| self.protocol.text_frame(tail))
    }
}

/// Returns `false` when the consumer is gone.
async fn send_tail(tx: &mpsc::Sender<StreamFrame>, tail: Option<StreamFrame>) -> bool {
    match tail {
        Some(frame) => tx.send(frame).await.is_ok(),
        None => true,
    }
}

async fn fail(tx: &mpsc::Sender<StreamFrame>, message: String, reason: String) -> ReadOutcome {
    for frame in [StreamFrame::error(message), StreamFrame::Done] {
        if tx.send(frame).await.is_err() {
            return ReadOutcome::Abandoned;
        }
    }
    ReadOutcome::Failed(reason)
}
