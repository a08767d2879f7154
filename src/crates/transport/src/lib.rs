/// Redraft Transport Layer
///
/// Wire framing shared by the server and its clients:
/// - `sse`: `StreamFrame` -> `data: <json>\n\n` (and `data: [DONE]\n\n`)
/// - `decoder`: SSE byte stream -> `StreamFrame`s
pub mod decoder;
pub mod sse;

pub use decoder::{decode_frames, TransportError};
pub use sse::{encode_frame, frame_data, DONE_SENTINEL};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
