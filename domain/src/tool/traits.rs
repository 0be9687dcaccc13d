//! Tool domain traits
//!
//! Contains pure domain logic traits for tool validation.
//! The async capability port is defined in the application layer (ports).

use super::entities::{ToolCall, ToolDefinition};

/// Validator for tool calls
///
/// This is a pure domain trait that validates tool calls
/// against their definitions without any I/O operations.
pub trait ToolValidator {
    /// Validate a tool call against its definition
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String>;
}

/// Default implementation of ToolValidator
///
/// Unknown arguments are rejected; models drift into inventing parameters
/// and the rejection message lets them self-correct on the next iteration.
#[derive(Debug, Clone, Default)]
pub struct DefaultToolValidator;

impl ToolValidator for DefaultToolValidator {
    fn validate(&self, call: &ToolCall, definition: &ToolDefinition) -> Result<(), String> {
        for param in &definition.parameters {
            let present = call
                .arguments
                .get(&param.name)
                .is_some_and(|v| !v.is_null());
            if param.required && !present {
                return Err(format!(
                    "Missing required parameter '{}' for tool '{}'",
                    param.name, definition.name
                ));
            }
            if !param.allowed_values.is_empty() {
                if let Some(value) = call.get_string(&param.name) {
                    let known = param
                        .allowed_values
                        .iter()
                        .any(|allowed| allowed.eq_ignore_ascii_case(value));
                    if !known {
                        return Err(format!(
                            "Invalid value '{}' for parameter '{}' of tool '{}' (expected one of: {})",
                            value,
                            param.name,
                            definition.name,
                            param.allowed_values.join(", ")
                        ));
                    }
                }
            }
        }

        let valid_params: std::collections::HashSet<&str> =
            definition.parameters.iter().map(|p| p.name.as_str()).collect();

        for arg_name in call.arguments.keys() {
            if !valid_params.contains(arg_name.as_str()) {
                return Err(format!(
                    "Unknown parameter '{}' for tool '{}'",
                    arg_name, definition.name
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::entities::{ToolKind, ToolParameter};

    fn definition() -> ToolDefinition {
        ToolDefinition::new("calculate_gfr", "eGFR", ToolKind::Research)
            .with_parameter(ToolParameter::new("creatinine_mg_dl", "Creatinine", true).with_type("number"))
            .with_parameter(
                ToolParameter::new("sex", "Sex", true).with_allowed_values(["male", "female"]),
            )
            .with_parameter(ToolParameter::new("race", "Ignored", false))
    }

    #[test]
    fn test_validator_missing_required() {
        let call = ToolCall::new("calculate_gfr").with_arg("sex", "male");
        let result = DefaultToolValidator.validate(&call, &definition());
        assert!(result.unwrap_err().contains("Missing required parameter 'creatinine_mg_dl'"));
    }

    #[test]
    fn test_validator_null_counts_as_missing() {
        let call = ToolCall::new("calculate_gfr")
            .with_arg("creatinine_mg_dl", serde_json::Value::Null)
            .with_arg("sex", "male");
        assert!(DefaultToolValidator.validate(&call, &definition()).is_err());
    }

    #[test]
    fn test_validator_unknown_param() {
        let call = ToolCall::new("calculate_gfr")
            .with_arg("creatinine_mg_dl", 1.1)
            .with_arg("sex", "male")
            .with_arg("weight", 80);
        let result = DefaultToolValidator.validate(&call, &definition());
        assert!(result.unwrap_err().contains("Unknown parameter 'weight'"));
    }

    #[test]
    fn test_validator_allowed_values_case_insensitive() {
        let ok = ToolCall::new("calculate_gfr")
            .with_arg("creatinine_mg_dl", 1.1)
            .with_arg("sex", "Female");
        assert!(DefaultToolValidator.validate(&ok, &definition()).is_ok());

        let bad = ToolCall::new("calculate_gfr")
            .with_arg("creatinine_mg_dl", 1.1)
            .with_arg("sex", "unknown");
        assert!(DefaultToolValidator.validate(&bad, &definition()).unwrap_err().contains("expected one of"));
    }
}
