/// Provider-neutral token usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedTokenUsage {
    pub prompt_token_count: u32,
    pub candidates_token_count: u32,
    pub total_token_count: u32,
}

/// One tool-call fragment. Only the first fragment of a call carries the id
/// and name; later ones carry argument text only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedToolCall {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

/// One normalized streaming delta.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnifiedResponse {
    pub text: Option<String>,
    pub tool_call: Option<UnifiedToolCall>,
    pub usage: Option<UnifiedTokenUsage>,
    pub finish_reason: Option<String>,
}
