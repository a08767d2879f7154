use log::debug;
use redraft_core_types::AnalysisPayload;
use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::json_recovery::{
    balanced_object_at, fenced_blocks, first_object, largest_object, parse_object,
    strip_code_fence,
};
use crate::markers::{MarkerProtocol, MarkerRule};

/// Recovers the analysis payload from a complete transcript.
///
/// Paired markers are tried first, in protocol order. Sentinels are only
/// consulted when no paired start marker occurs. Pure function of its input.
pub fn extract_analysis_payload(
    transcript: &str,
    protocol: &MarkerProtocol,
) -> Result<AnalysisPayload, ExtractionError> {
    let mut found_marker: Option<&str> = None;

    for marker in protocol.markers().iter().filter(|m| m.is_paired()) {
        let Some(region) = paired_region(transcript, marker) else {
            continue;
        };
        found_marker.get_or_insert(marker.start.as_str());
        if let Some(payload) = parse_paired_region(region) {
            return Ok(payload);
        }
    }

    if found_marker.is_none() {
        for marker in protocol.markers().iter().filter(|m| !m.is_paired()) {
            let Some(pos) = transcript.find(&marker.start) else {
                continue;
            };
            found_marker.get_or_insert(marker.start.as_str());
            let after = &transcript[pos + marker.start.len()..];
            if let Some(payload) = parse_after_sentinel(after) {
                debug!("Analysis payload recovered from legacy sentinel `{}`", marker.start);
                return Ok(payload);
            }
        }
    }

    match found_marker {
        Some(marker) => Err(ExtractionError::InvalidPayload {
            marker: marker.to_string(),
        }),
        None => Err(ExtractionError::NoMarker),
    }
}

/// Text between a paired start marker and its end marker (or end of transcript).
fn paired_region<'a>(transcript: &'a str, marker: &MarkerRule) -> Option<&'a str> {
    let start = transcript.find(&marker.start)? + marker.start.len();
    let region = &transcript[start..];
    let end = marker
        .end
        .as_deref()
        .and_then(|end| region.find(end))
        .unwrap_or(region.len());
    Some(&region[..end])
}

fn parse_paired_region(region: &str) -> Option<AnalysisPayload> {
    parse_object(strip_code_fence(region))
        .or_else(|| first_object(region))
        .and_then(into_payload)
}

fn parse_after_sentinel(after: &str) -> Option<AnalysisPayload> {
    let immediate = after.trim_start_matches(|c: char| c.is_whitespace() || c == ':');
    let offset = after.len() - immediate.len();

    balanced_object_at(after, offset)
        .and_then(parse_object)
        .and_then(into_payload)
        .or_else(|| {
            fenced_blocks(after)
                .into_iter()
                .find_map(|block| first_object(block).and_then(into_payload))
        })
        .or_else(|| largest_object(after).and_then(into_payload))
}

fn into_payload(object: Map<String, Value>) -> Option<AnalysisPayload> {
    serde_json::from_value(Value::Object(object)).ok()
}

/// Removes every marker region from `transcript`, the way the stream filter
/// does for visible text.
pub fn strip_markers(transcript: &str, protocol: &MarkerProtocol) -> String {
    let mut filter = crate::filter::MarkerFilter::new(protocol.clone());
    let mut visible = filter.push(transcript);
    visible.push_str(&filter.finish());
    visible
}
