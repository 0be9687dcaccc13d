//! Generation response types.
//!
//! The generation capability answers with content blocks mixing free text and
//! tool-use requests. The engine only ever looks at two things: which tool
//! calls were requested, and what text (if any) came with them.

use crate::tool::entities::ToolCall;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single block of content within a generation response.
///
/// # Examples
///
/// ```
/// use interconsult_domain::generation::response::ContentBlock;
///
/// let text = ContentBlock::Text("Assessing stroke risk.".to_string());
/// assert!(text.as_text().is_some());
///
/// let tool = ContentBlock::ToolUse {
///     id: "call_1".to_string(),
///     name: "calculate_chads2vasc".to_string(),
///     input: [("age".to_string(), serde_json::json!(78))].into_iter().collect(),
/// };
/// assert!(tool.as_text().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text content block from the model.
    Text(String),

    /// A tool use request from the model.
    ToolUse {
        /// Provider-assigned ID for correlating with tool results.
        id: String,
        /// Tool name as requested by the model (not yet validated).
        name: String,
        /// Structured arguments.
        input: HashMap<String, serde_json::Value>,
    },
}

impl ContentBlock {
    /// Returns the text content if this is a `Text` block.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    Other(String),
}

/// A structured response from the generation capability.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    /// Content blocks in the response (text and/or tool use).
    pub content: Vec<ContentBlock>,
    /// Why the model stopped generating.
    pub stop_reason: Option<StopReason>,
    /// Model identifier (if returned by the provider).
    pub model: Option<String>,
}

impl GenerationResponse {
    /// Create a text-only response.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text(text.into())],
            stop_reason: Some(StopReason::EndTurn),
            model: None,
        }
    }

    /// Create a response made only of tool calls. Calls without a native id
    /// get a positional one so results can still be correlated.
    pub fn from_tool_calls(calls: Vec<ToolCall>) -> Self {
        let content = calls
            .into_iter()
            .enumerate()
            .map(|(i, call)| ContentBlock::ToolUse {
                id: call.native_id.unwrap_or_else(|| format!("call_{}", i + 1)),
                name: call.tool_name,
                input: call.arguments,
            })
            .collect();
        Self {
            content,
            stop_reason: Some(StopReason::ToolUse),
            model: None,
        }
    }

    /// Concatenate all `Text` content blocks into a single string.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| b.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Extract all `ToolUse` content blocks as `Vec<ToolCall>`.
    pub fn tool_calls(&self) -> Vec<ToolCall> {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::ToolUse { id, name, input } => {
                    Some(ToolCall::from_native(id, name, input.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Returns `true` if the response contains any tool use requests.
    pub fn has_tool_calls(&self) -> bool {
        self.content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_creates_text_only_response() {
        let response = GenerationResponse::from_text("No consultation needed.");
        assert_eq!(response.text_content(), "No consultation needed.");
        assert!(!response.has_tool_calls());
        assert!(response.tool_calls().is_empty());
        assert_eq!(response.stop_reason, Some(StopReason::EndTurn));
    }

    #[test]
    fn test_from_tool_calls_assigns_positional_ids() {
        let response = GenerationResponse::from_tool_calls(vec![
            ToolCall::new("rag_query").with_arg("query", "anticoagulation"),
            ToolCall::new("calculate_bmi").with_native_id("call_x"),
        ]);
        let calls = response.tool_calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].native_id.as_deref(), Some("call_1"));
        assert_eq!(calls[1].native_id.as_deref(), Some("call_x"));
        assert_eq!(calls[0].get_string("query"), Some("anticoagulation"));
        assert_eq!(response.stop_reason, Some(StopReason::ToolUse));
    }

    #[test]
    fn test_mixed_response_keeps_text_and_calls() {
        let response = GenerationResponse {
            content: vec![
                ContentBlock::Text("Checking ".to_string()),
                ContentBlock::ToolUse {
                    id: "t1".to_string(),
                    name: "lookup_diagnostic_criteria".to_string(),
                    input: HashMap::new(),
                },
                ContentBlock::Text("criteria.".to_string()),
            ],
            stop_reason: Some(StopReason::ToolUse),
            model: Some("gpt-4o".to_string()),
        };
        assert!(response.has_tool_calls());
        assert_eq!(response.text_content(), "Checking criteria.");
    }
}
