use std::sync::OnceLock;

use redraft_core_types::RewriteResult;
use regex::Regex;

pub const FALLBACK_EXPLANATION: &str =
    "Text has been rewritten according to the provided guidelines.";

fn section_header() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER
        .get_or_init(|| {
            Regex::new(
                r"(?i)\*\*\s*(REWRITTEN\s+TEXT|EXPLANATION|KEY\s+IMPROVEMENTS)\s*(?::\s*\*\*|\*\*\s*:)",
            )
            .map_err(|e| log::error!("Invalid rewrite section pattern: {}", e))
            .ok()
        })
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    RewrittenText,
    Explanation,
    KeyImprovements,
}

impl Section {
    fn from_header(name: &str) -> Self {
        let name = name.to_ascii_uppercase();
        if name.starts_with("REWRITTEN") {
            Self::RewrittenText
        } else if name.starts_with("KEY") {
            Self::KeyImprovements
        } else {
            Self::Explanation
        }
    }
}

/// The three bold-headed sections of a rewrite transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteSections {
    pub rewritten_text: Option<String>,
    pub explanation: Option<String>,
    pub key_improvements: Vec<String>,
}

impl RewriteSections {
    /// Each section runs from its header to the next header or the end of
    /// the transcript. A repeated header keeps its first occurrence.
    pub fn parse(transcript: &str) -> Self {
        let Some(header) = section_header() else {
            return Self::default();
        };
        let headers: Vec<(Section, usize, usize)> = header
            .captures_iter(transcript)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                Some((Section::from_header(name.as_str()), whole.start(), whole.end()))
            })
            .collect();

        let mut sections = Self::default();
        let mut improvements: Option<&str> = None;

        for (index, (section, _, body_start)) in headers.iter().enumerate() {
            let body_end = headers
                .get(index + 1)
                .map(|(_, next_start, _)| *next_start)
                .unwrap_or(transcript.len());
            let body = transcript[*body_start..body_end].trim();

            match section {
                Section::RewrittenText => {
                    sections.rewritten_text.get_or_insert_with(|| body.to_string());
                }
                Section::Explanation => {
                    sections.explanation.get_or_insert_with(|| body.to_string());
                }
                Section::KeyImprovements => {
                    improvements.get_or_insert(body);
                }
            }
        }

        sections.key_improvements = improvements.map(improvement_items).unwrap_or_default();
        sections
    }
}

/// Splits a bullet or numbered list into its items.
pub fn improvement_items(body: &str) -> Vec<String> {
    body.lines()
        .map(|line| {
            let line = line.trim();
            let line = line
                .strip_prefix(['-', '*', '•'])
                .unwrap_or_else(|| strip_numbering(line));
            line.trim().to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return line;
    }
    line[digits..]
        .strip_prefix(['.', ')'])
        .unwrap_or(line)
}

/// Final rewrite result, or `None` when the model produced nothing.
pub fn build_rewrite_result(transcript: &str, original_text: &str) -> Option<RewriteResult> {
    let trimmed = transcript.trim();
    if trimmed.is_empty() {
        return None;
    }

    let sections = RewriteSections::parse(transcript);
    let rewritten_text = sections
        .rewritten_text
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| trimmed.to_string());
    let explanation = sections
        .explanation
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| FALLBACK_EXPLANATION.to_string());

    Some(RewriteResult {
        original_text: original_text.to_string(),
        rewritten_text,
        explanation,
        changes_highlighted: Vec::new(),
        key_improvements: sections.key_improvements,
    })
}
