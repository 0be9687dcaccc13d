//! Clinical record assembly: the pure merge step closing every run.
//!
//! Quality gates never block the record. Missing citations, weak evidence,
//! exhausted budgets and failed specialists become [`RecordWarning`]s.

use crate::config::EngineConfig;
use interconsult_domain::{
    ClinicalRecord, ClinicalRecordParts, ConsultationLedger, ConsultationPair, EvidenceLevel,
    NoteFlag, RecordWarning,
};

/// Inputs gathered by the run before assembly
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub case_id: String,
    pub original_question: String,
    pub gp_summary: String,
    /// Engine annotations appended to the GP summary
    pub summary_notes: Vec<String>,
    pub integrated_response: String,
    pub gp_trace: Vec<String>,
    /// Run-level warnings (truncation, iteration limit, cancellation)
    pub warnings: Vec<RecordWarning>,
    pub incomplete: bool,
}

#[derive(Debug, Clone)]
pub struct ClinicalRecordAssembler {
    require_citations: bool,
    min_evidence_level: Option<EvidenceLevel>,
}

impl ClinicalRecordAssembler {
    pub fn new(require_citations: bool, min_evidence_level: Option<EvidenceLevel>) -> Self {
        Self {
            require_citations,
            min_evidence_level,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.require_citations, config.min_evidence_level)
    }

    pub fn assemble(&self, draft: RecordDraft, ledger: ConsultationLedger) -> ClinicalRecord {
        let pairs = ledger.into_pairs();
        let mut warnings: Vec<RecordWarning> =
            pairs.iter().flat_map(|pair| self.pair_warnings(pair)).collect();
        warnings.extend(draft.warnings);

        let citations_satisfied = !self.require_citations
            || pairs
                .iter()
                .map(ConsultationPair::counter_referral)
                .filter(|reply| !reply.is_failure())
                .all(|reply| !reply.evidence_used().is_empty());

        let gp_summary = if draft.summary_notes.is_empty() {
            draft.gp_summary
        } else {
            format!("{}\n\n{}", draft.gp_summary, draft.summary_notes.join("\n"))
        };

        ClinicalRecord::new(ClinicalRecordParts {
            case_id: draft.case_id,
            original_question: draft.original_question,
            gp_summary,
            consultations: pairs,
            integrated_response: draft.integrated_response,
            gp_trace: draft.gp_trace,
            warnings,
            citations_satisfied,
            incomplete: draft.incomplete,
        })
    }

    fn pair_warnings(&self, pair: &ConsultationPair) -> Vec<RecordWarning> {
        let note = pair.consultation();
        let reply = pair.counter_referral();
        let consultation_id = note.consultation_id().clone();
        let specialty = note.specialty();

        if let Some(failure) = reply.failure() {
            return vec![RecordWarning::SpecialistFailed {
                consultation_id,
                specialty,
                failure: failure.kind,
                message: failure.message.clone(),
            }];
        }

        let mut warnings = Vec::new();
        if reply.has_flag(NoteFlag::CitationsMissing)
            || (self.require_citations && reply.evidence_used().is_empty())
        {
            warnings.push(RecordWarning::CitationsMissing {
                consultation_id: consultation_id.clone(),
                specialty,
            });
        }
        if let (Some(level), Some(minimum)) = (reply.evidence_level(), self.min_evidence_level) {
            if !level.meets(minimum) {
                warnings.push(RecordWarning::EvidenceBelowMinimum {
                    consultation_id: consultation_id.clone(),
                    specialty,
                    level,
                    minimum,
                });
            }
        }
        if reply.has_flag(NoteFlag::BudgetExhausted) {
            warnings.push(RecordWarning::BudgetExhausted {
                consultation_id,
                specialty,
            });
        }
        warnings
    }
}
