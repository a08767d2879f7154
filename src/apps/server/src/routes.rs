//! HTTP handlers

use std::convert::Infallible;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::{Stream, StreamExt};
use log::{error, warn};
use redraft_core::{FrameStream, RedraftError};
use redraft_core_types::{ChangeAnalysisRequest, ConversationMessage, RewriteRequest};
use redraft_transport::frame_data;
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

/// JSON error body `{error}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<RedraftError> for ApiError {
    fn from(err: RedraftError) -> Self {
        match err {
            RedraftError::Validation(message) => Self::bad_request(message),
            other => {
                error!("Request failed: {}", other);
                Self::internal("Failed to process request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Rejected request body: {}", rejection.body_text());
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

fn sse_events(frames: FrameStream) -> impl Stream<Item = Result<Event, Infallible>> {
    frames.filter_map(|frame| async move {
        match frame_data(&frame) {
            Ok(data) => Some(Ok(Event::default().data(data))),
            Err(e) => {
                error!("Dropping unserializable {} frame: {}", frame.kind(), e);
                None
            }
        }
    })
}

fn sse_response(frames: FrameStream) -> Response {
    Sse::new(sse_events(frames)).into_response()
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": redraft_core::VERSION }))
}

pub async fn analysis(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let frames = state.assistant.analyze(request.messages)?;
    Ok(sse_response(frames))
}

pub async fn rewrite(
    State(state): State<AppState>,
    payload: Result<Json<RewriteRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let frames = state.assistant.rewrite(request)?;
    Ok(sse_response(frames))
}

pub async fn analyze_changes(
    State(state): State<AppState>,
    payload: Result<Json<ChangeAnalysisRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let frames = state.assistant.analyze_changes(request)?;
    Ok(sse_response(frames))
}
