/// Version of the canonical analysis marker encoding.
///
/// v1: the payload sits between [`ANALYSIS_DATA_START`] and
/// [`ANALYSIS_DATA_END`]; an unterminated block runs to end of transcript.
pub const MARKER_PROTOCOL_VERSION: u32 = 1;

pub const ANALYSIS_DATA_START: &str = "---ANALYSIS_DATA_START---";
pub const ANALYSIS_DATA_END: &str = "---ANALYSIS_DATA_END---";

// TODO: retire the legacy sentinels once no deployed prompt emits them;
// drop `stream.legacy_marker_fallback` at the same time.
pub const LEGACY_TOOL_CALL_SENTINEL: &str = "🔄 ANALYSIS_COMPLETE_TOOL_CALL:";
pub const LEGACY_COMPLETE_SENTINEL: &str = "ANALYSIS_COMPLETE";

/// A start marker and, for paired encodings, the matching end marker.
/// A marker without an end hides everything after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerRule {
    pub start: String,
    pub end: Option<String>,
}

impl MarkerRule {
    pub fn paired(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    pub fn sentinel(start: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: None,
        }
    }

    pub fn is_paired(&self) -> bool {
        self.end.is_some()
    }
}

/// Ordered set of markers a stream may contain. Earlier entries win when
/// two markers start at the same position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerProtocol {
    markers: Vec<MarkerRule>,
}

impl MarkerProtocol {
    pub fn new(markers: Vec<MarkerRule>) -> Self {
        Self {
            markers: markers
                .into_iter()
                .filter(|m| !m.start.is_empty() && m.end.as_deref() != Some(""))
                .collect(),
        }
    }

    /// No markers; the filter passes text through untouched.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn analysis_v1() -> Self {
        Self::new(vec![MarkerRule::paired(ANALYSIS_DATA_START, ANALYSIS_DATA_END)])
    }

    pub fn with_legacy_sentinels(mut self) -> Self {
        self.markers
            .push(MarkerRule::sentinel(LEGACY_TOOL_CALL_SENTINEL));
        self.markers
            .push(MarkerRule::sentinel(LEGACY_COMPLETE_SENTINEL));
        self
    }

    pub fn markers(&self) -> &[MarkerRule] {
        &self.markers
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Every literal token the protocol can put in a transcript.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.markers
            .iter()
            .flat_map(|m| std::iter::once(m.start.as_str()).chain(m.end.as_deref()))
    }
}
