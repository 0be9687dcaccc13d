//! Engine budgets and policies from TOML (`[engine]` section)

use interconsult_domain::{ConfigIssue, ConfigIssueCode, EvidenceLevel, Specialty};
use serde::{Deserialize, Serialize};

/// Raw engine configuration from TOML
///
/// # Example
///
/// ```toml
/// [engine]
/// specialties = ["cardiology", "neurology", "pharmacology"]
/// max_specialists_per_consultation = 3
/// max_concurrent_consultations = 3
/// max_gp_iterations = 4
/// max_research_iterations = 6
/// specialist_timeout_secs = 90
/// tool_timeout_secs = 15
/// require_citations = true
/// min_evidence_level = "C"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    /// Available specialties; all of them when absent
    pub specialties: Option<Vec<String>>,
    pub max_specialists_per_consultation: usize,
    pub max_concurrent_consultations: usize,
    pub max_gp_iterations: usize,
    pub max_research_iterations: usize,
    pub specialist_timeout_secs: u64,
    pub tool_timeout_secs: u64,
    /// Wall-clock limit for a whole run
    pub run_timeout_secs: Option<u64>,
    pub require_citations: bool,
    /// Weakest acceptable evidence level ("A" to "D"); empty disables the check
    pub min_evidence_level: Option<String>,
    pub consultation_mandatory: bool,
    /// Generation attempts per call, including the first
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            specialties: None,
            max_specialists_per_consultation: 3,
            max_concurrent_consultations: 3,
            max_gp_iterations: 4,
            max_research_iterations: 6,
            specialist_timeout_secs: 90,
            tool_timeout_secs: 15,
            run_timeout_secs: None,
            require_citations: true,
            min_evidence_level: Some("C".to_string()),
            consultation_mandatory: false,
            retry_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl FileEngineConfig {
    /// Parse specialty names; unknown names are skipped and reported
    pub fn parse_specialties(&self) -> (Vec<Specialty>, Vec<ConfigIssue>) {
        let Some(names) = &self.specialties else {
            return (Specialty::ALL.to_vec(), Vec::new());
        };
        let mut issues = Vec::new();
        let mut specialties = Vec::new();
        for name in names {
            match name.parse::<Specialty>() {
                Ok(specialty) => specialties.push(specialty),
                Err(_) => issues.push(ConfigIssue::warning(
                    ConfigIssueCode::UnknownSpecialty,
                    format!(
                        "engine.specialties: unknown specialty '{}' (known: {})",
                        name,
                        Specialty::ALL
                            .iter()
                            .map(|s| s.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )),
            }
        }
        (specialties, issues)
    }

    pub fn parse_min_evidence_level(&self) -> (Option<EvidenceLevel>, Vec<ConfigIssue>) {
        match self.min_evidence_level.as_deref().map(str::trim) {
            None | Some("") => (None, Vec::new()),
            Some(level) => match level.parse::<EvidenceLevel>() {
                Ok(level) => (Some(level), Vec::new()),
                Err(_) => (
                    None,
                    vec![ConfigIssue::error(
                        ConfigIssueCode::InvalidEvidenceLevel,
                        format!(
                            "engine.min_evidence_level: '{}' is not one of A, B, C, D",
                            level
                        ),
                    )],
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_specialties_means_all() {
        let (specialties, issues) = FileEngineConfig::default().parse_specialties();
        assert_eq!(specialties.len(), Specialty::ALL.len());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_unknown_specialty_is_skipped() {
        let config = FileEngineConfig {
            specialties: Some(vec!["cardiology".to_string(), "dermatology".to_string()]),
            ..Default::default()
        };
        let (specialties, issues) = config.parse_specialties();
        assert_eq!(specialties, vec![Specialty::Cardiology]);
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownSpecialty);
        assert!(issues[0].message.contains("dermatology"));
    }

    #[test]
    fn test_evidence_level_parsing() {
        let mut config = FileEngineConfig::default();
        assert_eq!(config.parse_min_evidence_level().0, Some(EvidenceLevel::C));

        config.min_evidence_level = Some(String::new());
        assert_eq!(config.parse_min_evidence_level().0, None);

        config.min_evidence_level = Some("E".to_string());
        let (level, issues) = config.parse_min_evidence_level();
        assert!(level.is_none());
        assert!(issues[0].is_error());
    }
}
