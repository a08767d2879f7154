//! Writing-instruction retrieval
//!
//! A query (optionally enriched with text type, tone, purpose and audience)
//! goes to a vector-search backend; the top matches come back formatted as
//! one instruction string. Every failure degrades to
//! [`NO_DOCUMENTS_FOUND`] so callers never see a retrieval error.

#[cfg(feature = "vectorize")]
pub mod vectorize;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use redraft_core_types::NO_DOCUMENTS_FOUND;
use serde::{Deserialize, Serialize};

pub const DEFAULT_NUM_RESULTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub text: String,
    #[serde(default)]
    pub source_display_name: Option<String>,
    #[serde(default)]
    pub similarity: Option<f64>,
}

#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("retrieval request failed: {0}")]
    Http(String),
    #[error("retrieval service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid retrieval response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait DocumentSearch: Send + Sync {
    async fn retrieve_documents(
        &self,
        question: &str,
        num_results: usize,
    ) -> Result<Vec<RetrievedDocument>, RetrievalError>;
}

/// Optional hints folded into the search query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchContext {
    pub text_type: Option<String>,
    pub tone: Option<String>,
    pub purpose: Option<String>,
    pub audience: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `"{textType} rewriting instructions: {query} (tone: .., purpose: .., audience: ..)"`,
/// leaving out whatever is unknown.
pub fn enhance_query(query: &str, context: &SearchContext) -> String {
    let mut enhanced = match present(&context.text_type) {
        Some(text_type) => format!("{} rewriting instructions: {}", text_type, query),
        None => query.to_string(),
    };

    let parts: Vec<String> = [
        ("tone", &context.tone),
        ("purpose", &context.purpose),
        ("audience", &context.audience),
    ]
    .into_iter()
    .filter_map(|(label, value)| present(value).map(|v| format!("{}: {}", label, v)))
    .collect();

    if !parts.is_empty() {
        enhanced.push_str(&format!(" ({})", parts.join(", ")));
    }
    enhanced
}

pub fn format_documents_for_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .filter(|doc| !doc.text.trim().is_empty())
        .enumerate()
        .map(|(index, doc)| {
            let source = doc
                .source_display_name
                .as_deref()
                .filter(|s| !s.is_empty());
            match source {
                Some(source) => format!("Document {} ({}):\n{}", index + 1, source, doc.text.trim()),
                None => format!("Document {}:\n{}", index + 1, doc.text.trim()),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Retrieval front end used by the agents. Without a backend every search
/// returns [`NO_DOCUMENTS_FOUND`].
#[derive(Clone)]
pub struct InstructionRetriever {
    backend: Option<Arc<dyn DocumentSearch>>,
    num_results: usize,
}

impl InstructionRetriever {
    pub fn new(backend: Arc<dyn DocumentSearch>, num_results: usize) -> Self {
        Self {
            backend: Some(backend),
            num_results: num_results.max(1),
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: None,
            num_results: DEFAULT_NUM_RESULTS,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn search_documents(&self, query: &str, context: &SearchContext) -> String {
        let Some(backend) = &self.backend else {
            debug!("Retrieval disabled, skipping search");
            return NO_DOCUMENTS_FOUND.to_string();
        };

        let enhanced = enhance_query(query, context);
        debug!("Searching documents: query={}", enhanced);

        match backend.retrieve_documents(&enhanced, self.num_results).await {
            Ok(documents) => {
                let formatted = format_documents_for_context(&documents);
                if formatted.is_empty() {
                    NO_DOCUMENTS_FOUND.to_string()
                } else {
                    formatted
                }
            }
            Err(e) => {
                warn!("Document retrieval failed, continuing without instructions: {}", e);
                NO_DOCUMENTS_FOUND.to_string()
            }
        }
    }
}

impl std::fmt::Debug for InstructionRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstructionRetriever")
            .field("enabled", &self.is_enabled())
            .field("num_results", &self.num_results)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FixedSearch {
        result: Mutex<Option<Result<Vec<RetrievedDocument>, RetrievalError>>>,
        questions: Mutex<Vec<String>>,
    }

    impl FixedSearch {
        fn new(result: Result<Vec<RetrievedDocument>, RetrievalError>) -> Arc<Self> {
            Arc::new(Self {
                result: Mutex::new(Some(result)),
                questions: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DocumentSearch for FixedSearch {
        async fn retrieve_documents(
            &self,
            question: &str,
            _num_results: usize,
        ) -> Result<Vec<RetrievedDocument>, RetrievalError> {
            self.questions.lock().unwrap().push(question.to_string());
            self.result.lock().unwrap().take().unwrap_or(Ok(Vec::new()))
        }
    }

    fn doc(text: &str, source: Option<&str>) -> RetrievedDocument {
        RetrievedDocument {
            text: text.to_string(),
            source_display_name: source.map(str::to_string),
            similarity: Some(0.9),
        }
    }

    #[test]
    fn query_enhancement_includes_known_context_only() {
        let context = SearchContext {
            text_type: Some("email".into()),
            tone: Some("formal".into()),
            purpose: None,
            audience: Some(" ".into()),
        };
        assert_eq!(
            enhance_query("follow up", &context),
            "email rewriting instructions: follow up (tone: formal)"
        );
        assert_eq!(enhance_query("follow up", &SearchContext::default()), "follow up");
    }

    #[test]
    fn documents_are_numbered_with_sources() {
        let formatted = format_documents_for_context(&[
            doc("Keep it short.", Some("style-guide.pdf")),
            doc("   ", None),
            doc("Use active voice.", None),
        ]);
        assert_eq!(
            formatted,
            "Document 1 (style-guide.pdf):\nKeep it short.\n\nDocument 2:\nUse active voice."
        );
    }

    #[tokio::test]
    async fn failures_and_empty_results_degrade() {
        let failing = FixedSearch::new(Err(RetrievalError::Http("refused".into())));
        let retriever = InstructionRetriever::new(failing, 3);
        assert_eq!(
            retriever.search_documents("q", &SearchContext::default()).await,
            NO_DOCUMENTS_FOUND
        );

        let empty = FixedSearch::new(Ok(vec![doc("", None)]));
        let retriever = InstructionRetriever::new(empty, 3);
        assert_eq!(
            retriever.search_documents("q", &SearchContext::default()).await,
            NO_DOCUMENTS_FOUND
        );

        assert_eq!(
            InstructionRetriever::disabled()
                .search_documents("q", &SearchContext::default())
                .await,
            NO_DOCUMENTS_FOUND
        );
    }

    #[tokio::test]
    async fn backend_receives_enhanced_query() {
        let backend = FixedSearch::new(Ok(vec![doc("Be direct.", Some("guide"))]));
        let retriever = InstructionRetriever::new(backend.clone(), 3);
        let context = SearchContext {
            text_type: Some("LinkedIn post".into()),
            ..Default::default()
        };

        let instructions = retriever.search_documents("networking", &context).await;
        assert_eq!(instructions, "Document 1 (guide):\nBe direct.");
        assert_eq!(
            backend.questions.lock().unwrap().as_slice(),
            ["LinkedIn post rewriting instructions: networking".to_string()]
        );
    }
}
