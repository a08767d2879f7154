#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("no analysis marker found in transcript")]
    NoMarker,
    #[error("marker `{marker}` found but no valid payload followed it")]
    InvalidPayload { marker: String },
    #[error("transcript is empty")]
    EmptyTranscript,
    #[error("no JSON object found in transcript")]
    NoJsonObject,
    #[error("payload is missing `{0}`")]
    MissingField(String),
}
