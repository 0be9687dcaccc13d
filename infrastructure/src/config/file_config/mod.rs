//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into an [`EngineConfig`]
//! once validated.

mod engine;
mod knowledge;
mod models;
mod output;
mod providers;

pub use engine::FileEngineConfig;
pub use knowledge::{FileKnowledgeConfig, FileLiteratureConfig, FileLoggingConfig};
pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use providers::FileProviderConfig;

use interconsult_application::{EngineConfig, RetryPolicy};
use interconsult_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Budgets and quality policies
    pub engine: FileEngineConfig,
    /// GP and specialist models
    pub models: FileModelsConfig,
    /// Specialty knowledge base
    pub knowledge: FileKnowledgeConfig,
    /// Literature search
    pub literature: FileLiteratureConfig,
    /// Generation endpoint
    pub provider: FileProviderConfig,
    /// Diagnostic logs and run transcripts
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Parse failures (unknown specialties, evidence levels, empty model
    /// names) come first, then the engine's own budget checks.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.engine.parse_specialties().1);
        issues.extend(self.engine.parse_min_evidence_level().1);
        issues.extend(self.models.parse_gp().1);
        issues.extend(self.models.parse_specialist().1);

        if self.engine.require_citations
            && self.knowledge.dir.is_none()
            && !self.literature.enabled
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::NoCitationSource,
                "citations are required but neither [knowledge] dir nor [literature] is enabled",
            ));
        }

        issues.extend(self.to_engine_config().validate());
        issues
    }

    /// Build the engine configuration; invalid values fall back to defaults
    pub fn to_engine_config(&self) -> EngineConfig {
        let engine = &self.engine;
        let defaults = EngineConfig::default();
        EngineConfig {
            available_specialties: engine.parse_specialties().0,
            max_specialists_per_consultation: engine.max_specialists_per_consultation,
            max_concurrent_consultations: engine.max_concurrent_consultations,
            max_gp_iterations: engine.max_gp_iterations,
            max_research_iterations: engine.max_research_iterations,
            specialist_timeout: Duration::from_secs(engine.specialist_timeout_secs),
            tool_timeout: Duration::from_secs(engine.tool_timeout_secs),
            run_timeout: engine.run_timeout_secs.map(Duration::from_secs),
            require_citations: engine.require_citations,
            min_evidence_level: engine.parse_min_evidence_level().0,
            consultation_mandatory: engine.consultation_mandatory,
            generation_retry: RetryPolicy {
                max_attempts: engine.retry_attempts,
                initial_backoff: Duration::from_millis(engine.retry_backoff_ms),
                ..RetryPolicy::default()
            },
            gp_model: self.models.parse_gp().0.unwrap_or(defaults.gp_model),
            specialist_model: self
                .models
                .parse_specialist()
                .0
                .unwrap_or(defaults.specialist_model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interconsult_domain::{EvidenceLevel, Model, OutputFormat, Specialty};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[engine]
specialties = ["cardiology", "pharmacology"]
max_specialists_per_consultation = 2
max_concurrent_consultations = 2
specialist_timeout_secs = 60
min_evidence_level = "B"

[models]
gp = "gpt-4.1"
specialist = "gpt-4o-mini"

[knowledge]
dir = "/srv/kb"
top_k = 5

[literature]
email = "clinic@example.org"

[output]
format = "json"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_specialists_per_consultation, 2);
        assert_eq!(config.knowledge.top_k, 5);
        assert_eq!(config.literature.email.as_deref(), Some("clinic@example.org"));
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);

        let engine = config.to_engine_config();
        assert_eq!(
            engine.available_specialties,
            vec![Specialty::Cardiology, Specialty::Pharmacology]
        );
        assert_eq!(engine.specialist_timeout, Duration::from_secs(60));
        assert_eq!(engine.min_evidence_level, Some(EvidenceLevel::B));
        assert_eq!(engine.gp_model, Model::Gpt41);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[engine]
max_gp_iterations = 2
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.max_gp_iterations, 2);
        // Defaults should apply
        assert_eq!(config.engine.max_research_iterations, 6);
        assert!(config.engine.require_citations);
        assert!(config.literature.enabled);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.to_engine_config().max_gp_iterations, 4);
    }

    #[test]
    fn test_validate_collects_all_issues() {
        let toml_str = r#"
[engine]
specialties = ["cardiology", "astrology"]
max_gp_iterations = 0
min_evidence_level = "Z"

[models]
gp = ""

[literature]
enabled = false
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let codes: Vec<_> = config.validate().iter().map(|i| i.code).collect();
        assert!(codes.contains(&ConfigIssueCode::UnknownSpecialty));
        assert!(codes.contains(&ConfigIssueCode::InvalidEvidenceLevel));
        assert!(codes.contains(&ConfigIssueCode::EmptyModelName));
        assert!(codes.contains(&ConfigIssueCode::NoCitationSource));
        assert!(codes.contains(&ConfigIssueCode::ZeroBudget));
    }
}
