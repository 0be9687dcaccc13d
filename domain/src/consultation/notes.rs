//! Consultation and counter-referral notes
//!
//! Both notes are immutable once built: fields are private and only readable
//! through accessors. A [`ConsultationNote`] is created by the GP controller
//! when it dispatches; a [`CounterReferralNote`] is produced by a specialist
//! (or, on failure, stands in as a placeholder carrying the failure marker).

use super::evidence::EvidenceLevel;
use super::specialty::{Specialty, Urgency};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifier of a consultation, unique within one run
///
/// Identifiers are assigned from a per-run sequence in dispatch order, so the
/// same sequence of GP decisions always yields the same identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsultationId(String);

impl ConsultationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for the n-th consultation of a run (1-based)
    pub fn from_sequence(n: u32) -> Self {
        Self(format!("C-{:03}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConsultationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the GP asked for in one `ConsultSpecialist` action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRequest {
    pub specialty: Specialty,
    pub patient_context: String,
    pub clinical_question: String,
    pub expected_response: String,
    pub urgency: Urgency,
}

/// Request note sent from the GP to a specialist (nota de interconsulta)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationNote {
    consultation_id: ConsultationId,
    specialty: Specialty,
    patient_context: String,
    clinical_question: String,
    expected_response: String,
    urgency: Urgency,
    created_at: DateTime<Utc>,
}

impl ConsultationNote {
    pub fn new(consultation_id: ConsultationId, request: ConsultationRequest) -> Self {
        Self {
            consultation_id,
            specialty: request.specialty,
            patient_context: request.patient_context,
            clinical_question: request.clinical_question,
            expected_response: request.expected_response,
            urgency: request.urgency,
            created_at: Utc::now(),
        }
    }

    pub fn consultation_id(&self) -> &ConsultationId {
        &self.consultation_id
    }

    pub fn specialty(&self) -> Specialty {
        self.specialty
    }

    pub fn patient_context(&self) -> &str {
        &self.patient_context
    }

    pub fn clinical_question(&self) -> &str {
        &self.clinical_question
    }

    pub fn expected_response(&self) -> &str {
        &self.expected_response
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Quality flag attached to a counter-referral that was accepted in degraded form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteFlag {
    /// Produced by the forced conclusion after the iteration budget ran out
    BudgetExhausted,
    /// Citations were required but still absent after the corrective iteration
    CitationsMissing,
    /// Declared evidence level is weaker than the configured minimum
    EvidenceBelowMinimum,
}

impl NoteFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteFlag::BudgetExhausted => "budget_exhausted",
            NoteFlag::CitationsMissing => "citations_missing",
            NoteFlag::EvidenceBelowMinimum => "evidence_below_minimum",
        }
    }
}

impl std::fmt::Display for NoteFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a specialist produced no clinical content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Wall-clock timeout of the specialist runner
    Timeout,
    /// Run-level cancellation reached the specialist before it finished
    Cancelled,
    /// Generation capability stayed unavailable after bounded retries
    GenerationUnavailable,
    /// Generation kept returning unusable output
    MalformedOutput,
    /// Anything else (task panic, unknown consultation id)
    Internal,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
            FailureKind::GenerationUnavailable => "generation_unavailable",
            FailureKind::MalformedOutput => "malformed_output",
            FailureKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure marker of a specialist consultation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialistFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SpecialistFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "run cancelled before the specialist finished")
    }
}

impl std::fmt::Display for SpecialistFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Clinical content of a counter-referral, as submitted by the specialist model
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReferralContent {
    pub clinical_assessment: String,
    pub recommendations: String,
    pub evidence_used: Vec<String>,
    pub diagnostic_criteria_met: BTreeMap<String, bool>,
    pub additional_info_needed: Vec<String>,
    pub evidence_level: Option<EvidenceLevel>,
}

/// Response note from a specialist back to the GP (nota de contrarreferencia)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterReferralNote {
    consultation_id: ConsultationId,
    specialty: Specialty,
    clinical_assessment: String,
    recommendations: String,
    evidence_used: Vec<String>,
    diagnostic_criteria_met: BTreeMap<String, bool>,
    additional_info_needed: Vec<String>,
    evidence_level: Option<EvidenceLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flags: Vec<NoteFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failure: Option<SpecialistFailure>,
    completed_at: DateTime<Utc>,
}

impl CounterReferralNote {
    /// Counter-referral answering `consultation` with the given content
    pub fn answering(consultation: &ConsultationNote, content: CounterReferralContent) -> Self {
        Self {
            consultation_id: consultation.consultation_id().clone(),
            specialty: consultation.specialty(),
            clinical_assessment: content.clinical_assessment,
            recommendations: content.recommendations,
            evidence_used: content.evidence_used,
            diagnostic_criteria_met: content.diagnostic_criteria_met,
            additional_info_needed: content.additional_info_needed,
            evidence_level: content.evidence_level,
            flags: Vec::new(),
            failure: None,
            completed_at: Utc::now(),
        }
    }

    /// Placeholder standing in for a consultation that produced no content
    pub fn failure_placeholder(consultation: &ConsultationNote, failure: SpecialistFailure) -> Self {
        let mut note = Self::answering(consultation, CounterReferralContent::default());
        note.clinical_assessment = format!(
            "No assessment available: {} consultation failed ({}).",
            consultation.specialty().display_name(),
            failure
        );
        note.failure = Some(failure);
        note
    }

    /// Attach a quality flag; flags are deduplicated and keep insertion order
    pub fn with_flag(mut self, flag: NoteFlag) -> Self {
        if !self.flags.contains(&flag) {
            self.flags.push(flag);
        }
        self
    }

    pub fn consultation_id(&self) -> &ConsultationId {
        &self.consultation_id
    }

    pub fn specialty(&self) -> Specialty {
        self.specialty
    }

    pub fn clinical_assessment(&self) -> &str {
        &self.clinical_assessment
    }

    pub fn recommendations(&self) -> &str {
        &self.recommendations
    }

    pub fn evidence_used(&self) -> &[String] {
        &self.evidence_used
    }

    pub fn diagnostic_criteria_met(&self) -> &BTreeMap<String, bool> {
        &self.diagnostic_criteria_met
    }

    pub fn additional_info_needed(&self) -> &[String] {
        &self.additional_info_needed
    }

    pub fn evidence_level(&self) -> Option<EvidenceLevel> {
        self.evidence_level
    }

    pub fn flags(&self) -> &[NoteFlag] {
        &self.flags
    }

    pub fn has_flag(&self, flag: NoteFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn failure(&self) -> Option<&SpecialistFailure> {
        self.failure.as_ref()
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }

    /// Completed, but with at least one quality flag
    pub fn is_degraded(&self) -> bool {
        !self.flags.is_empty()
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }
}

/// Terminal outcome of one specialist runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialistOutcome {
    Completed(CounterReferralNote),
    Failed(SpecialistFailure),
}

impl SpecialistOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, SpecialistOutcome::Completed(_))
    }

    pub fn failure(&self) -> Option<&SpecialistFailure> {
        match self {
            SpecialistOutcome::Failed(failure) => Some(failure),
            SpecialistOutcome::Completed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note(n: u32, specialty: Specialty) -> ConsultationNote {
        ConsultationNote::new(
            ConsultationId::from_sequence(n),
            ConsultationRequest {
                specialty,
                patient_context: "78-year-old woman with atrial fibrillation and hypertension".to_string(),
                clinical_question: "Is anticoagulation indicated?".to_string(),
                expected_response: "Stroke risk and recommendation".to_string(),
                urgency: Urgency::Urgent,
            },
        )
    }

    #[test]
    fn test_sequence_ids_are_zero_padded() {
        assert_eq!(ConsultationId::from_sequence(1).as_str(), "C-001");
        assert_eq!(ConsultationId::from_sequence(42).to_string(), "C-042");
    }

    #[test]
    fn test_counter_referral_copies_identity() {
        let note = sample_note(1, Specialty::Cardiology);
        let reply = CounterReferralNote::answering(
            &note,
            CounterReferralContent {
                clinical_assessment: "CHA2DS2-VASc 4".to_string(),
                recommendations: "Start a DOAC".to_string(),
                evidence_used: vec!["ESC 2020 AF guidelines".to_string()],
                evidence_level: Some(EvidenceLevel::A),
                ..Default::default()
            },
        );
        assert_eq!(reply.consultation_id(), note.consultation_id());
        assert_eq!(reply.specialty(), Specialty::Cardiology);
        assert!(!reply.is_failure());
        assert!(!reply.is_degraded());
    }

    #[test]
    fn test_flags_are_deduplicated() {
        let note = sample_note(1, Specialty::Neurology);
        let reply = CounterReferralNote::answering(&note, CounterReferralContent::default())
            .with_flag(NoteFlag::CitationsMissing)
            .with_flag(NoteFlag::BudgetExhausted)
            .with_flag(NoteFlag::CitationsMissing);
        assert_eq!(reply.flags(), &[NoteFlag::CitationsMissing, NoteFlag::BudgetExhausted]);
        assert!(reply.is_degraded());
    }

    #[test]
    fn test_failure_placeholder_carries_marker() {
        let note = sample_note(2, Specialty::Pharmacology);
        let placeholder = CounterReferralNote::failure_placeholder(
            &note,
            SpecialistFailure::new(FailureKind::Timeout, "exceeded 90s"),
        );
        assert!(placeholder.is_failure());
        assert_eq!(placeholder.failure().unwrap().kind, FailureKind::Timeout);
        assert!(placeholder.clinical_assessment().contains("Pharmacology consultation failed"));
        assert!(placeholder.evidence_used().is_empty());
    }
}
