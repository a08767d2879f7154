use redraft_core_types::StreamFrame;

/// Payload written for the terminal frame instead of its JSON form.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Contents of the `data:` field for one frame.
pub fn frame_data(frame: &StreamFrame) -> serde_json::Result<String> {
    match frame {
        StreamFrame::Done => Ok(DONE_SENTINEL.to_string()),
        other => serde_json::to_string(other),
    }
}

/// Full SSE event for one frame, including the blank-line terminator.
pub fn encode_frame(frame: &StreamFrame) -> serde_json::Result<String> {
    Ok(format!("data: {}\n\n", frame_data(frame)?))
}
