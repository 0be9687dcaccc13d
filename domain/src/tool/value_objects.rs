//! Tool domain value objects: immutable result and error types
//!
//! Every routed tool invocation produces a [`ToolResult`]. Failures are data,
//! not exceptions: the research loop appends them to the specialist's
//! observation history verbatim so the model can adapt (retry with other
//! arguments, skip a calculator, answer qualitatively).

use serde::{Deserialize, Serialize};

/// Error that occurred during tool execution.
///
/// | Code | Meaning |
/// |------|---------|
/// | `NOT_FOUND` | Unknown tool, tool outside the specialty's set, unknown criteria |
/// | `INVALID_ARGUMENT` | Missing/wrong parameters or out-of-range calculator input |
/// | `RATE_LIMITED` | Upstream literature service throttled the request |
/// | `EXECUTION_FAILED` | Runtime failure inside the capability (I/O, HTTP) |
/// | `TIMEOUT` | Capability exceeded its individual timeout |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolError {
    /// Error code (e.g., "NOT_FOUND", "TIMEOUT")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", format!("Not found: {}", resource.into()))
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("INVALID_ARGUMENT", message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new("RATE_LIMITED", message)
    }

    pub fn execution_failed(message: impl Into<String>) -> Self {
        Self::new("EXECUTION_FAILED", message)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::new(
            "TIMEOUT",
            format!("Operation timed out: {}", operation.into()),
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        self.code == "RATE_LIMITED"
    }
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ToolError {}

/// Result of a routed tool invocation, carrying output or error information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Output content (for successful execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error information (for failed execution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    /// Wall-clock duration of the invocation in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(tool_name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: true,
            output: Some(output.into()),
            error: None,
            duration_ms: None,
        }
    }

    /// Create a failed result
    pub fn failure(tool_name: impl Into<String>, error: ToolError) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: None,
            error: Some(error),
            duration_ms: None,
        }
    }

    /// Add duration metadata
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Check if execution was successful
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Get the output content
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Get the error
    pub fn error(&self) -> Option<&ToolError> {
        self.error.as_ref()
    }

    /// Render the result as the observation text fed back to the model
    pub fn to_observation(&self) -> String {
        match (&self.output, &self.error) {
            (Some(output), _) if self.success => output.clone(),
            (_, Some(error)) => format!(
                "Tool '{}' failed: {}. Adjust the arguments, use another tool, or continue without it.",
                self.tool_name, error
            ),
            _ => format!("Tool '{}' returned no output.", self.tool_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_error() {
        let err = ToolError::not_found("criteria 'lupus'").with_details("available: diabetes");

        assert_eq!(err.code, "NOT_FOUND");
        assert!(err.message.contains("lupus"));
        assert_eq!(
            err.to_string(),
            "[NOT_FOUND] Not found: criteria 'lupus' (available: diabetes)"
        );
    }

    #[test]
    fn test_tool_result_success() {
        let result = ToolResult::success("calculate_bmi", "BMI 24.2").with_duration(3);

        assert!(result.is_success());
        assert_eq!(result.output(), Some("BMI 24.2"));
        assert!(result.error().is_none());
        assert_eq!(result.duration_ms, Some(3));
        assert_eq!(result.to_observation(), "BMI 24.2");
    }

    #[test]
    fn test_tool_result_failure_observation() {
        let result = ToolResult::failure("literature_search", ToolError::timeout("literature_search"));

        assert!(!result.is_success());
        assert!(result.output().is_none());
        assert_eq!(result.error().unwrap().code, "TIMEOUT");
        let observation = result.to_observation();
        assert!(observation.starts_with("Tool 'literature_search' failed: [TIMEOUT]"));
    }

    #[test]
    fn test_rate_limited_flag() {
        assert!(ToolError::rate_limited("429").is_rate_limited());
        assert!(!ToolError::execution_failed("500").is_rate_limited());
    }
}
