//! Engine configuration: budgets, limits and policies for one run.

use interconsult_domain::{ConfigIssue, ConfigIssueCode, EvidenceLevel, Model, Specialty};
use std::time::Duration;

/// Bounded retry with exponential backoff for transient generation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based: the delay after the first failure is `backoff(1)`)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .max(1)
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Configuration of the orchestration engine.
///
/// | Budget                    | Scope              | Default |
/// |---------------------------|--------------------|---------|
/// | `max_gp_iterations`       | GP decisions       | 4       |
/// | `max_research_iterations` | one specialist     | 6       |
/// | `specialist_timeout`      | one specialist     | 90 s    |
/// | `tool_timeout`            | one tool call      | 15 s    |
/// | `run_timeout`             | whole run          | none    |
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub available_specialties: Vec<Specialty>,
    /// Consultations dispatched per GP turn; excess requests are truncated.
    pub max_specialists_per_consultation: usize,
    /// Specialists running at the same time; excess consultations queue.
    pub max_concurrent_consultations: usize,
    pub max_gp_iterations: usize,
    pub max_research_iterations: usize,
    pub specialist_timeout: Duration,
    pub tool_timeout: Duration,
    /// Wall-clock limit for the whole run; raises the run's cancellation token.
    pub run_timeout: Option<Duration>,
    pub require_citations: bool,
    pub min_evidence_level: Option<EvidenceLevel>,
    /// Whether a run without any consultable specialty is a configuration error.
    pub consultation_mandatory: bool,
    pub generation_retry: RetryPolicy,
    pub gp_model: Model,
    pub specialist_model: Model,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            available_specialties: Specialty::ALL.to_vec(),
            max_specialists_per_consultation: 3,
            max_concurrent_consultations: 3,
            max_gp_iterations: 4,
            max_research_iterations: 6,
            specialist_timeout: Duration::from_secs(90),
            tool_timeout: Duration::from_secs(15),
            run_timeout: None,
            require_citations: true,
            min_evidence_level: Some(EvidenceLevel::C),
            consultation_mandatory: false,
            generation_retry: RetryPolicy::default(),
            gp_model: Model::default(),
            specialist_model: Model::default(),
        }
    }
}

impl EngineConfig {
    // ==================== Builder Methods ====================

    pub fn with_specialties(mut self, specialties: impl IntoIterator<Item = Specialty>) -> Self {
        self.available_specialties = specialties.into_iter().collect();
        self
    }

    pub fn with_max_specialists(mut self, max: usize) -> Self {
        self.max_specialists_per_consultation = max;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_consultations = max;
        self
    }

    pub fn with_max_gp_iterations(mut self, max: usize) -> Self {
        self.max_gp_iterations = max;
        self
    }

    pub fn with_max_research_iterations(mut self, max: usize) -> Self {
        self.max_research_iterations = max;
        self
    }

    pub fn with_specialist_timeout(mut self, timeout: Duration) -> Self {
        self.specialist_timeout = timeout;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    pub fn with_require_citations(mut self, required: bool) -> Self {
        self.require_citations = required;
        self
    }

    pub fn with_min_evidence_level(mut self, level: Option<EvidenceLevel>) -> Self {
        self.min_evidence_level = level;
        self
    }

    pub fn with_consultation_mandatory(mut self, mandatory: bool) -> Self {
        self.consultation_mandatory = mandatory;
        self
    }

    pub fn with_generation_retry(mut self, policy: RetryPolicy) -> Self {
        self.generation_retry = policy;
        self
    }

    pub fn with_models(mut self, gp: Model, specialist: Model) -> Self {
        self.gp_model = gp;
        self.specialist_model = specialist;
        self
    }

    // ==================== Validation ====================

    /// Detect invalid or questionable settings.
    ///
    /// Errors make the run impossible; warnings are reported and ignored.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.available_specialties.is_empty() {
            if self.consultation_mandatory {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::NoSpecialties,
                    "consultation is mandatory but no specialty is available",
                ));
            } else {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::NoSpecialties,
                    "no specialty is available; the GP can only answer directly",
                ));
            }
        }

        let budgets = [
            ("max_specialists_per_consultation", self.max_specialists_per_consultation),
            ("max_concurrent_consultations", self.max_concurrent_consultations),
            ("max_gp_iterations", self.max_gp_iterations),
            ("max_research_iterations", self.max_research_iterations),
            ("generation_retry.max_attempts", self.generation_retry.max_attempts as usize),
        ];
        for (name, value) in budgets {
            if value == 0 {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroBudget,
                    format!("{} must be at least 1", name),
                ));
            }
        }
        for (name, value) in [
            ("specialist_timeout", self.specialist_timeout),
            ("tool_timeout", self.tool_timeout),
        ] {
            if value.is_zero() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::ZeroBudget,
                    format!("{} must be greater than zero", name),
                ));
            }
        }

        let mut seen = Vec::new();
        for specialty in &self.available_specialties {
            if seen.contains(specialty) {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::DuplicateSpecialty,
                    format!("specialty '{}' is listed more than once", specialty),
                ));
            } else {
                seen.push(*specialty);
            }
        }

        if self.max_concurrent_consultations > self.max_specialists_per_consultation
            && self.max_specialists_per_consultation > 0
        {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::ConcurrencyExceedsBatch,
                format!(
                    "max_concurrent_consultations ({}) exceeds max_specialists_per_consultation ({}); extra slots stay idle",
                    self.max_concurrent_consultations, self.max_specialists_per_consultation
                ),
            ));
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interconsult_domain::Severity;

    #[test]
    fn test_default_is_valid() {
        let issues = EngineConfig::default().validate();
        assert!(!ConfigIssue::any_errors(&issues), "{:?}", issues);
        assert_eq!(EngineConfig::default().available_specialties.len(), 10);
    }

    #[test]
    fn test_no_specialties_mandatory_is_error() {
        let issues = EngineConfig::default()
            .with_specialties([])
            .with_consultation_mandatory(true)
            .validate();
        assert_eq!(issues[0].code, ConfigIssueCode::NoSpecialties);
        assert_eq!(issues[0].severity, Severity::Error);
    }

    #[test]
    fn test_no_specialties_optional_is_warning() {
        let issues = EngineConfig::default().with_specialties([]).validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
    }

    #[test]
    fn test_zero_budget_is_error() {
        let issues = EngineConfig::default().with_max_research_iterations(0).validate();
        assert!(issues
            .iter()
            .any(|i| i.code == ConfigIssueCode::ZeroBudget && i.message.contains("max_research_iterations")));
    }

    #[test]
    fn test_duplicate_specialty_warns() {
        let issues = EngineConfig::default()
            .with_specialties([Specialty::Cardiology, Specialty::Cardiology])
            .validate();
        assert!(issues.iter().any(|i| i.code == ConfigIssueCode::DuplicateSpecialty));
        assert!(!ConfigIssue::any_errors(&issues));
    }

    #[test]
    fn test_concurrency_above_batch_warns() {
        let issues = EngineConfig::default()
            .with_max_specialists(2)
            .with_max_concurrent(4)
            .validate();
        assert!(issues.iter().any(|i| i.code == ConfigIssueCode::ConcurrencyExceedsBatch));
    }

    #[test]
    fn test_backoff_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }
}
