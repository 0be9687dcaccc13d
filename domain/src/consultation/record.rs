//! The clinical record: final artifact of a consultation run

use super::evidence::EvidenceLevel;
use super::ledger::ConsultationPair;
use super::notes::{ConsultationId, FailureKind};
use super::specialty::Specialty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Quality annotation recorded on a clinical record
///
/// Policy violations never block record production; they end up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordWarning {
    CitationsMissing {
        consultation_id: ConsultationId,
        specialty: Specialty,
    },
    EvidenceBelowMinimum {
        consultation_id: ConsultationId,
        specialty: Specialty,
        level: EvidenceLevel,
        minimum: EvidenceLevel,
    },
    BudgetExhausted {
        consultation_id: ConsultationId,
        specialty: Specialty,
    },
    SpecialistFailed {
        consultation_id: ConsultationId,
        specialty: Specialty,
        failure: FailureKind,
        message: String,
    },
    ConsultationsTruncated {
        requested: usize,
        dispatched: usize,
    },
    GpIterationLimit {
        limit: usize,
    },
    IntegrationUnavailable {
        message: String,
    },
    RunCancelled,
}

impl std::fmt::Display for RecordWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordWarning::CitationsMissing {
                consultation_id,
                specialty,
            } => write!(
                f,
                "{} ({}) cites no evidence although citations are required",
                specialty.display_name(),
                consultation_id
            ),
            RecordWarning::EvidenceBelowMinimum {
                consultation_id,
                specialty,
                level,
                minimum,
            } => write!(
                f,
                "{} ({}) reports evidence level {} below the minimum {}",
                specialty.display_name(),
                consultation_id,
                level,
                minimum
            ),
            RecordWarning::BudgetExhausted {
                consultation_id,
                specialty,
            } => write!(
                f,
                "{} ({}) concluded after exhausting its research budget",
                specialty.display_name(),
                consultation_id
            ),
            RecordWarning::SpecialistFailed {
                consultation_id,
                specialty,
                failure,
                message,
            } => write!(
                f,
                "{} ({}) failed [{}]: {}",
                specialty.display_name(),
                consultation_id,
                failure,
                message
            ),
            RecordWarning::ConsultationsTruncated {
                requested,
                dispatched,
            } => write!(
                f,
                "GP requested {} consultations in one turn; only {} were dispatched",
                requested, dispatched
            ),
            RecordWarning::GpIterationLimit { limit } => write!(
                f,
                "GP reached its iteration limit ({}) before completing integration",
                limit
            ),
            RecordWarning::IntegrationUnavailable { message } => write!(
                f,
                "GP integration was unavailable ({}); the response was assembled from the counter-referrals",
                message
            ),
            RecordWarning::RunCancelled => write!(f, "Run was cancelled before integration"),
        }
    }
}

/// Final aggregated artifact of a run (expediente clínico)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    case_id: String,
    original_question: String,
    gp_summary: String,
    consultations: Vec<ConsultationPair>,
    integrated_response: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    gp_trace: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<RecordWarning>,
    citations_satisfied: bool,
    incomplete: bool,
    created_at: DateTime<Utc>,
}

/// Everything needed to build a [`ClinicalRecord`]
#[derive(Debug, Clone, Default)]
pub struct ClinicalRecordParts {
    pub case_id: String,
    pub original_question: String,
    pub gp_summary: String,
    pub consultations: Vec<ConsultationPair>,
    pub integrated_response: String,
    pub gp_trace: Vec<String>,
    pub warnings: Vec<RecordWarning>,
    pub citations_satisfied: bool,
    pub incomplete: bool,
}

impl ClinicalRecord {
    pub fn new(parts: ClinicalRecordParts) -> Self {
        Self {
            case_id: parts.case_id,
            original_question: parts.original_question,
            gp_summary: parts.gp_summary,
            consultations: parts.consultations,
            integrated_response: parts.integrated_response,
            gp_trace: parts.gp_trace,
            warnings: parts.warnings,
            citations_satisfied: parts.citations_satisfied,
            incomplete: parts.incomplete,
            created_at: Utc::now(),
        }
    }

    pub fn case_id(&self) -> &str {
        &self.case_id
    }

    pub fn original_question(&self) -> &str {
        &self.original_question
    }

    pub fn gp_summary(&self) -> &str {
        &self.gp_summary
    }

    pub fn consultations(&self) -> &[ConsultationPair] {
        &self.consultations
    }

    pub fn integrated_response(&self) -> &str {
        &self.integrated_response
    }

    pub fn gp_trace(&self) -> &[String] {
        &self.gp_trace
    }

    pub fn warnings(&self) -> &[RecordWarning] {
        &self.warnings
    }

    /// Every successful counter-referral carries at least one citation
    pub fn citations_satisfied(&self) -> bool {
        self.citations_satisfied
    }

    /// Integration was forced (iteration limit or cancellation)
    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the GP answered without consulting anyone
    pub fn is_direct_answer(&self) -> bool {
        self.consultations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = RecordWarning::ConsultationsTruncated {
            requested: 3,
            dispatched: 2,
        };
        assert_eq!(
            w.to_string(),
            "GP requested 3 consultations in one turn; only 2 were dispatched"
        );

        let w = RecordWarning::CitationsMissing {
            consultation_id: ConsultationId::from_sequence(1),
            specialty: Specialty::InternalMedicine,
        };
        assert!(w.to_string().starts_with("Internal Medicine (C-001)"));
    }

    #[test]
    fn test_record_json_shape() {
        let record = ClinicalRecord::new(ClinicalRecordParts {
            case_id: "case-1".to_string(),
            original_question: "q".to_string(),
            gp_summary: "s".to_string(),
            integrated_response: "r".to_string(),
            citations_satisfied: true,
            warnings: vec![RecordWarning::RunCancelled],
            ..Default::default()
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["case_id"], "case-1");
        assert_eq!(json["citations_satisfied"], true);
        assert_eq!(json["warnings"][0]["kind"], "run_cancelled");
        assert!(json.get("gp_trace").is_none());
        assert!(record.is_direct_answer());
    }
}
