//! Model selection from TOML (`[models]` section)

use interconsult_domain::{ConfigIssue, ConfigIssueCode, Model};
use serde::{Deserialize, Serialize};

/// Model configuration from TOML
///
/// # Example
///
/// ```toml
/// [models]
/// gp = "gpt-4.1"            # Triage and integration
/// specialist = "gpt-4o-mini" # Research loops
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Model for the GP
    pub gp: Option<String>,
    /// Model for every specialist
    pub specialist: Option<String>,
}

impl FileModelsConfig {
    /// Parse a single model string, collecting issues for empty names.
    fn parse_single_model(field: &str, value: Option<&String>) -> (Option<Model>, Vec<ConfigIssue>) {
        match value {
            None => (None, Vec::new()),
            Some(s) if s.trim().is_empty() => (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    format!("models.{}: model name cannot be empty", field),
                )],
            ),
            Some(s) => (Some(Model::from(s.trim())), Vec::new()),
        }
    }

    pub fn parse_gp(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("gp", self.gp.as_ref())
    }

    pub fn parse_specialist(&self) -> (Option<Model>, Vec<ConfigIssue>) {
        Self::parse_single_model("specialist", self.specialist.as_ref())
    }
}
