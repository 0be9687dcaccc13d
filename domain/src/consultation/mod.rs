//! Consultation domain: who is consulted, what they are asked, what they answer.
//!
//! ```text
//! ConsultationRequest ──▶ ConsultationNote ──▶ (specialist) ──▶ CounterReferralNote
//!                               │                                      │
//!                               └──────────── ConsultationPair ◀───────┘
//!                                                   │
//!                                  ConsultationLedger ──▶ ClinicalRecord
//! ```

pub mod evidence;
pub mod ledger;
pub mod notes;
pub mod record;
pub mod specialty;

pub use evidence::EvidenceLevel;
pub use ledger::{ConsultationLedger, ConsultationPair};
pub use notes::{
    ConsultationId, ConsultationNote, ConsultationRequest, CounterReferralContent,
    CounterReferralNote, FailureKind, NoteFlag, SpecialistFailure, SpecialistOutcome,
};
pub use record::{ClinicalRecord, ClinicalRecordParts, RecordWarning};
pub use specialty::{Specialty, Urgency};
