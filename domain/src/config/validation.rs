//! Structured configuration issues.
//!
//! Engine and file configuration are validated into a list of
//! [`ConfigIssue`]s. Errors make a run impossible; warnings are reported
//! and the run proceeds.

use serde::Serialize;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigIssueCode {
    /// Consultation is mandatory but no specialty is available.
    NoSpecialties,
    /// A max-count or budget is zero.
    ZeroBudget,
    /// A specialty name in the file does not match the known set.
    UnknownSpecialty,
    /// The minimum evidence level is not one of A-D.
    InvalidEvidenceLevel,
    /// More concurrent consultations than specialists per consultation.
    ConcurrencyExceedsBatch,
    /// Citations are required but no research source is configured.
    NoCitationSource,
    /// A specialty is listed more than once.
    DuplicateSpecialty,
    /// A model name is empty.
    EmptyModelName,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// True when any issue in the slice is fatal
    pub fn any_errors(issues: &[ConfigIssue]) -> bool {
        issues.iter().any(ConfigIssue::is_error)
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", label, self.message)
    }
}
