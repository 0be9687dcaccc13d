//! lookup_diagnostic_criteria over the static criteria table

use async_trait::async_trait;
use interconsult_application::ToolCapability;
use interconsult_domain::clinical::{catalog, criteria};
use interconsult_domain::{Specialty, ToolCall, ToolDefinition, ToolError};

pub struct CriteriaCapability;

#[async_trait]
impl ToolCapability for CriteriaCapability {
    fn definition(&self) -> ToolDefinition {
        catalog::lookup_diagnostic_criteria()
    }

    async fn invoke(&self, call: &ToolCall, _specialty: Specialty) -> Result<String, ToolError> {
        let condition = call
            .require_string("condition")
            .map_err(ToolError::invalid_argument)?;
        let found = criteria::lookup(condition).map_err(|e| {
            ToolError::not_found(format!("diagnostic criteria for '{}'", e.condition))
                .with_details(format!("available: {}", e.available.join(", ")))
        })?;
        Ok(format!(
            "Diagnostic criteria: {}\nSource: {}\n\n{}",
            found.condition, found.source, found.criteria
        ))
    }
}
