use std::sync::Arc;

use redraft_core::RewriteAssistant;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<RewriteAssistant>,
}

impl AppState {
    pub fn new(assistant: RewriteAssistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}
