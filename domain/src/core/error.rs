//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("No specialties configured for consultation")]
    NoSpecialties,

    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Unknown specialty: {0}")]
    UnknownSpecialty(String),

    #[error("Invalid urgency level: {0}")]
    InvalidUrgency(String),

    #[error("Invalid evidence level: {0}")]
    InvalidEvidenceLevel(String),

    #[error("Consultation {0} is not open in this run")]
    UnknownConsultation(String),

    #[error("Counter-referral for {actual} does not answer consultation {expected}")]
    ConsultationMismatch { expected: String, actual: String },

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_error_display() {
        let error = DomainError::Cancelled;
        assert_eq!(error.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_is_cancelled_check() {
        assert!(DomainError::Cancelled.is_cancelled());
        assert!(!DomainError::NoSpecialties.is_cancelled());
        assert!(!DomainError::InvalidQuestion("test".to_string()).is_cancelled());
    }

    #[test]
    fn test_mismatch_display_names_both_ids() {
        let error = DomainError::ConsultationMismatch {
            expected: "C-001".to_string(),
            actual: "C-002".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Counter-referral for C-002 does not answer consultation C-001"
        );
    }
}
