//! Per-run state shared by the GP controller and the dispatcher.

use interconsult_domain::{
    ConsultationId, ConsultationNote, ConsultationPair, ConsultationRequest, DomainError,
    FailureKind, SpecialistFailure, SpecialistOutcome,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// State of one consultation run.
///
/// Created at run start and dropped when the record is assembled; never
/// shared between runs. The open/resolved sets are mutated only by the GP
/// side of the run, between dispatcher calls. Specialist runners see the
/// semaphore and a child of the cancellation token, nothing else.
#[derive(Debug)]
pub struct RunState {
    case_id: String,
    next_sequence: u32,
    open: BTreeSet<ConsultationId>,
    resolved: BTreeSet<ConsultationId>,
    semaphore: Arc<Semaphore>,
    token: CancellationToken,
}

impl RunState {
    pub fn new(case_id: impl Into<String>, max_concurrent: usize, token: CancellationToken) -> Self {
        Self {
            case_id: case_id.into(),
            next_sequence: 0,
            open: BTreeSet::new(),
            resolved: BTreeSet::new(),
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            token,
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    /// Create the note for a request and mark it open.
    ///
    /// Identifiers follow request issuance order (`C-001`, `C-002`, ...), so
    /// identical runs assign identical identifiers.
    pub fn open_consultation(&mut self, request: ConsultationRequest) -> ConsultationNote {
        self.next_sequence += 1;
        let id = ConsultationId::from_sequence(self.next_sequence);
        self.open.insert(id.clone());
        ConsultationNote::new(id, request)
    }

    pub fn is_open(&self, id: &ConsultationId) -> bool {
        self.open.contains(id)
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.len()
    }

    /// Close a consultation with the runner's outcome.
    ///
    /// A counter-referral whose identifier is not open is rejected and the
    /// slot is closed with an internal failure instead, so every dispatched
    /// note still ends up in exactly one pair.
    pub fn resolve(&mut self, note: ConsultationNote, outcome: SpecialistOutcome) -> ConsultationPair {
        let outcome = match self.check_open(&note, &outcome) {
            Ok(()) => outcome,
            Err(e) => {
                warn!(consultation_id = %note.consultation_id(), "Rejected counter-referral: {}", e);
                SpecialistOutcome::Failed(SpecialistFailure::new(FailureKind::Internal, e.to_string()))
            }
        };
        self.open.remove(note.consultation_id());
        self.resolved.insert(note.consultation_id().clone());
        match ConsultationPair::from_outcome(note.clone(), outcome) {
            Ok(pair) => pair,
            Err(e) => ConsultationPair::failed(
                note,
                SpecialistFailure::new(FailureKind::Internal, e.to_string()),
            ),
        }
    }

    fn check_open(&self, note: &ConsultationNote, outcome: &SpecialistOutcome) -> Result<(), DomainError> {
        let id = match outcome {
            SpecialistOutcome::Completed(reply) => reply.consultation_id(),
            SpecialistOutcome::Failed(_) => note.consultation_id(),
        };
        if !self.open.contains(id) {
            return Err(DomainError::UnknownConsultation(id.to_string()));
        }
        if id != note.consultation_id() {
            return Err(DomainError::ConsultationMismatch {
                expected: note.consultation_id().to_string(),
                actual: id.to_string(),
            });
        }
        Ok(())
    }

    pub fn semaphore(&self) -> Arc<Semaphore> {
        Arc::clone(&self.semaphore)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interconsult_domain::{CounterReferralContent, CounterReferralNote, Specialty, Urgency};

    fn request(specialty: Specialty) -> ConsultationRequest {
        ConsultationRequest {
            specialty,
            patient_context: "72-year-old".to_string(),
            clinical_question: "Assess".to_string(),
            expected_response: "Plan".to_string(),
            urgency: Urgency::Routine,
        }
    }

    fn answer(note: &ConsultationNote) -> SpecialistOutcome {
        SpecialistOutcome::Completed(CounterReferralNote::answering(
            note,
            CounterReferralContent {
                clinical_assessment: "ok".to_string(),
                evidence_used: vec!["ESC 2020".to_string()],
                ..Default::default()
            },
        ))
    }

    #[test]
    fn test_ids_follow_issuance_order() {
        let mut run = RunState::new("case", 2, CancellationToken::new());
        let a = run.open_consultation(request(Specialty::Cardiology));
        let b = run.open_consultation(request(Specialty::Neurology));
        assert_eq!(a.consultation_id().as_str(), "C-001");
        assert_eq!(b.consultation_id().as_str(), "C-002");
        assert_eq!(run.open_count(), 2);
    }

    #[test]
    fn test_resolve_moves_id_to_resolved() {
        let mut run = RunState::new("case", 2, CancellationToken::new());
        let note = run.open_consultation(request(Specialty::Cardiology));
        let outcome = answer(&note);
        let pair = run.resolve(note.clone(), outcome);
        assert!(!pair.counter_referral().is_failure());
        assert!(!run.is_open(note.consultation_id()));
        assert_eq!(run.resolved_count(), 1);
    }

    #[test]
    fn test_reply_for_unknown_consultation_is_rejected() {
        let mut run = RunState::new("case", 2, CancellationToken::new());
        let note = run.open_consultation(request(Specialty::Cardiology));
        let stranger = ConsultationNote::new(
            ConsultationId::new("C-999"),
            request(Specialty::Cardiology),
        );
        let pair = run.resolve(note.clone(), answer(&stranger));
        let failure = pair.counter_referral().failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Internal);
        assert!(failure.message.contains("C-999"));
        assert_eq!(pair.consultation().consultation_id(), note.consultation_id());
    }

    #[test]
    fn test_reply_for_sibling_consultation_is_rejected() {
        let mut run = RunState::new("case", 2, CancellationToken::new());
        let first = run.open_consultation(request(Specialty::Cardiology));
        let second = run.open_consultation(request(Specialty::Neurology));
        let pair = run.resolve(first, answer(&second));
        assert!(pair.counter_referral().is_failure());
        assert!(run.is_open(second.consultation_id()));
    }

    #[test]
    fn test_semaphore_has_at_least_one_permit() {
        let run = RunState::new("case", 0, CancellationToken::new());
        assert_eq!(run.semaphore().available_permits(), 1);
    }
}
