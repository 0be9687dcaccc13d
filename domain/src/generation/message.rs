//! Conversation history exchanged with the generation capability

use crate::tool::entities::ToolCall;
use crate::tool::value_objects::ToolResult;
use serde::{Deserialize, Serialize};

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A message in an agent's conversation history
///
/// Assistant messages carry the tool calls the model made; tool messages
/// carry the observation for one of those calls, correlated by call id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
            tool_name: None,
        }
    }

    /// Observation for a single tool call
    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: call.native_id.clone(),
            tool_name: Some(call.tool_name.clone()),
        }
    }

    /// Observation built from a routed [`ToolResult`]
    pub fn tool_result(call: &ToolCall, result: &ToolResult) -> Self {
        Self::tool(call, result.to_observation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ToolError;

    #[test]
    fn test_tool_message_correlates_with_call() {
        let call = ToolCall::new("calculate_bmi").with_native_id("call_7");
        let msg = Message::tool_result(&call, &ToolResult::success("calculate_bmi", "BMI 31.0"));
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(msg.tool_name.as_deref(), Some("calculate_bmi"));
        assert_eq!(msg.content, "BMI 31.0");
    }

    #[test]
    fn test_failed_result_becomes_observation_text() {
        let call = ToolCall::new("rag_query");
        let result = ToolResult::failure("rag_query", ToolError::execution_failed("index offline"));
        let msg = Message::tool_result(&call, &result);
        assert!(msg.content.contains("[EXECUTION_FAILED] index offline"));
    }
}
