use redraft_core_types::{ChangeAnalysisResult, ChangeImportance, ChangeKind, TextChange};
use serde_json::{Map, Value};

use crate::error::ExtractionError;
use crate::json_recovery::largest_object;

const DEFAULT_SUMMARY: &str = "Analysis completed successfully.";

/// Parses a change-analysis transcript: the largest JSON object in it must
/// carry a `changes` array. Ids are assigned in order and positions are
/// located in `original_text`.
pub fn extract_change_analysis(
    transcript: &str,
    original_text: &str,
) -> Result<ChangeAnalysisResult, ExtractionError> {
    if transcript.trim().is_empty() {
        return Err(ExtractionError::EmptyTranscript);
    }
    let object = largest_object(transcript).ok_or(ExtractionError::NoJsonObject)?;
    let changes = object
        .get("changes")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::MissingField("changes".to_string()))?;

    let changes = changes
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, change)| build_change(index, change, original_text))
        .collect();

    let summary = string_field(&object, "summary")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUMMARY.to_string());
    let overall_improvements = object
        .get("overallImprovements")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(ChangeAnalysisResult {
        changes,
        summary,
        overall_improvements,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn build_change(index: usize, change: &Map<String, Value>, original_text: &str) -> TextChange {
    let original_phrase = string_field(change, "originalPhrase").unwrap_or_default();
    let (start_pos, end_pos) = char_span(original_text, &original_phrase);

    TextChange {
        id: format!("change-{}", index + 1),
        kind: ChangeKind::from_label(&string_field(change, "type").unwrap_or_default()),
        rewritten_phrase: string_field(change, "rewrittenPhrase").unwrap_or_default(),
        explanation: string_field(change, "explanation").unwrap_or_default(),
        importance: ChangeImportance::from_label(
            &string_field(change, "importance").unwrap_or_default(),
        ),
        original_phrase,
        start_pos,
        end_pos,
    }
}

/// Character offsets of the first occurrence of `phrase`; `(0, 0)` when absent.
fn char_span(text: &str, phrase: &str) -> (usize, usize) {
    if phrase.is_empty() {
        return (0, 0);
    }
    match text.find(phrase) {
        Some(byte_start) => {
            let start = text[..byte_start].chars().count();
            (start, start + phrase.chars().count())
        }
        None => (0, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGINAL: &str = "Héllo team, i has finished the report.";

    #[test]
    fn assigns_ids_and_character_positions() {
        let transcript = r#"Here is my analysis:
```json
{
  "changes": [
    {"type": "grammar", "originalPhrase": "i has", "rewrittenPhrase": "I have",
     "explanation": "subject-verb agreement", "importance": "high"},
    {"type": "formality", "originalPhrase": "not in text", "rewrittenPhrase": "x",
     "explanation": "", "importance": "unknown"}
  ],
  "summary": "Fixed grammar.",
  "overallImprovements": ["Correct grammar", " "]
}
```"#;

        let result = extract_change_analysis(transcript, ORIGINAL).unwrap();
        assert_eq!(result.changes.len(), 2);

        let first = &result.changes[0];
        assert_eq!(first.id, "change-1");
        assert_eq!(first.kind, ChangeKind::Grammar);
        assert_eq!(first.importance, ChangeImportance::High);
        assert_eq!((first.start_pos, first.end_pos), (12, 17));

        let second = &result.changes[1];
        assert_eq!(second.id, "change-2");
        assert_eq!(second.kind, ChangeKind::Clarity);
        assert_eq!(second.importance, ChangeImportance::Medium);
        assert_eq!((second.start_pos, second.end_pos), (0, 0));

        assert_eq!(result.summary, "Fixed grammar.");
        assert_eq!(result.overall_improvements, vec!["Correct grammar"]);
    }

    #[test]
    fn missing_summary_gets_default() {
        let result = extract_change_analysis(r#"{"changes": []}"#, ORIGINAL).unwrap();
        assert_eq!(result.summary, DEFAULT_SUMMARY);
        assert!(result.overall_improvements.is_empty());
    }

    #[test]
    fn unusable_transcripts_are_errors() {
        assert_eq!(
            extract_change_analysis("", ORIGINAL),
            Err(ExtractionError::EmptyTranscript)
        );
        assert_eq!(
            extract_change_analysis("no json here", ORIGINAL),
            Err(ExtractionError::NoJsonObject)
        );
        assert_eq!(
            extract_change_analysis(r#"{"summary": "x"}"#, ORIGINAL),
            Err(ExtractionError::MissingField("changes".to_string()))
        );
    }
}
