//! Plain-text summaries of finished results

use std::fmt::Write;

use redraft_core_types::{AnalysisResult, ChangeAnalysisResult, RewriteResult};

pub fn analysis_summary(analysis: &AnalysisResult) -> String {
    let mut out = String::new();
    let context = &analysis.extracted_context;
    let _ = writeln!(out, "Text type: {}", analysis.detected_text_type);
    let _ = writeln!(out, "Tone:      {}", context.tone);
    let _ = writeln!(out, "Purpose:   {}", context.purpose);
    let _ = writeln!(out, "Audience:  {}", context.audience);
    if !analysis.recommendations.is_empty() {
        let _ = writeln!(out, "Recommendations:");
        for item in &analysis.recommendations {
            let _ = writeln!(out, "  - {}", item);
        }
    }
    out
}

pub fn rewrite_summary(result: &RewriteResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Rewritten text:\n{}\n", result.rewritten_text);
    if !result.explanation.is_empty() {
        let _ = writeln!(out, "Explanation:\n{}", result.explanation);
    }
    if !result.key_improvements.is_empty() {
        let _ = writeln!(out, "Key improvements:");
        for item in &result.key_improvements {
            let _ = writeln!(out, "  - {}", item);
        }
    }
    out
}

pub fn changes_summary(result: &ChangeAnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", result.summary);
    for change in &result.changes {
        let _ = writeln!(
            out,
            "  [{:?}/{:?}] \"{}\" -> \"{}\": {}",
            change.kind, change.importance, change.original_phrase, change.rewritten_phrase, change.explanation
        );
    }
    if !result.overall_improvements.is_empty() {
        let _ = writeln!(out, "Overall:");
        for item in &result.overall_improvements {
            let _ = writeln!(out, "  - {}", item);
        }
    }
    out
}
