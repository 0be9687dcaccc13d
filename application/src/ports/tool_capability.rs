//! Tool capability port
//!
//! A capability is the typed function bound to one research tool name.
//! The `ToolRouter` owns the name → capability mapping.

use async_trait::async_trait;
use interconsult_domain::{Specialty, ToolCall, ToolDefinition, ToolError};

#[async_trait]
pub trait ToolCapability: Send + Sync {
    /// Schema offered to the generation capability
    fn definition(&self) -> ToolDefinition;

    /// Execute the call on behalf of a specialist, returning the observation text
    async fn invoke(&self, call: &ToolCall, specialty: Specialty) -> Result<String, ToolError>;
}
