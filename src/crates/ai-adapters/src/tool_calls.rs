use serde_json::Value;

use crate::types::unified::UnifiedToolCall;

/// A tool call reassembled from its streamed fragments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl AssembledToolCall {
    /// Parses the argument text; an empty string counts as `{}`.
    pub fn parse_arguments(&self) -> serde_json::Result<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.arguments)
    }
}

/// Collects tool-call fragments for one provider round.
///
/// A fragment with a new id starts a new call; fragments without an id
/// extend the most recent one.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    calls: Vec<AssembledToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: UnifiedToolCall) {
        let starts_new_call = match (&fragment.id, self.calls.last()) {
            (Some(id), Some(last)) => *id != last.id,
            (Some(_), None) | (None, None) => true,
            (None, Some(_)) => false,
        };

        if starts_new_call {
            let id = fragment
                .id
                .unwrap_or_else(|| format!("call_{}", self.calls.len()));
            self.calls.push(AssembledToolCall {
                id,
                name: String::new(),
                arguments: String::new(),
            });
        }

        if let Some(call) = self.calls.last_mut() {
            if let Some(name) = fragment.name {
                if call.name.is_empty() {
                    call.name = name;
                }
            }
            if let Some(arguments) = fragment.arguments {
                call.arguments.push_str(&arguments);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn finish(self) -> Vec<AssembledToolCall> {
        self.calls
            .into_iter()
            .filter(|call| !call.name.is_empty())
            .collect()
    }
}
