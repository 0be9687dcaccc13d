//! GP controller phases

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Phase of the GP state machine
///
/// ```text
/// Intake ──▶ DirectAnswer (terminal)
///   │
///   └──▶ Dispatching ──▶ AwaitingSpecialists ──▶ Integrating ──▶ Complete (terminal)
///             ▲                   │                   │
///             └───────────────────┼───────────────────┘ (another batch)
///                                 └──▶ Complete (cancelled mid-dispatch)
/// ```
///
/// `reflect` never changes the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpPhase {
    Intake,
    DirectAnswer,
    Dispatching,
    AwaitingSpecialists,
    Integrating,
    Complete,
}

impl GpPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            GpPhase::Intake => "intake",
            GpPhase::DirectAnswer => "direct_answer",
            GpPhase::Dispatching => "dispatching",
            GpPhase::AwaitingSpecialists => "awaiting_specialists",
            GpPhase::Integrating => "integrating",
            GpPhase::Complete => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GpPhase::DirectAnswer | GpPhase::Complete)
    }

    pub fn can_transition_to(&self, next: GpPhase) -> bool {
        use GpPhase::*;
        matches!(
            (self, next),
            (Intake, DirectAnswer)
                | (Intake, Dispatching)
                | (Dispatching, AwaitingSpecialists)
                | (AwaitingSpecialists, Integrating)
                | (AwaitingSpecialists, Complete)
                | (Integrating, Dispatching)
                | (Integrating, Complete)
        )
    }

    /// Move to `next`, rejecting transitions the state machine does not allow
    pub fn transition(self, next: GpPhase) -> Result<GpPhase, DomainError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for GpPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consultation_path() {
        let phase = GpPhase::Intake
            .transition(GpPhase::Dispatching)
            .and_then(|p| p.transition(GpPhase::AwaitingSpecialists))
            .and_then(|p| p.transition(GpPhase::Integrating))
            .and_then(|p| p.transition(GpPhase::Dispatching))
            .and_then(|p| p.transition(GpPhase::AwaitingSpecialists))
            .and_then(|p| p.transition(GpPhase::Integrating))
            .and_then(|p| p.transition(GpPhase::Complete))
            .unwrap();
        assert!(phase.is_terminal());
    }

    #[test]
    fn test_direct_answer_is_terminal() {
        let phase = GpPhase::Intake.transition(GpPhase::DirectAnswer).unwrap();
        assert!(phase.is_terminal());
        assert!(phase.transition(GpPhase::Dispatching).is_err());
    }

    #[test]
    fn test_rejects_skipping_dispatch() {
        let err = GpPhase::Intake.transition(GpPhase::Integrating).unwrap_err();
        assert_eq!(err.to_string(), "Invalid phase transition: intake -> integrating");
        assert!(GpPhase::Dispatching.transition(GpPhase::Complete).is_err());
    }
}
