//! Domain layer for interconsult
//!
//! This crate contains the core clinical-consultation entities, value objects
//! and pure rules. It has no dependencies on infrastructure or presentation
//! concerns.
//!
//! # Core Concepts
//!
//! ## Interconsultation
//!
//! A coordinating general practitioner (GP) triages a clinical question and
//! either answers directly or writes [`ConsultationNote`]s to specialists.
//! Each specialist runs a bounded research loop and answers with a
//! [`CounterReferralNote`]. Notes are paired in dispatch order in a
//! [`ConsultationLedger`] and merged into a [`ClinicalRecord`].
//!
//! ## Degradation as data
//!
//! Timeouts, exhausted budgets and missing citations never make a record
//! impossible. They become [`NoteFlag`]s on notes and [`RecordWarning`]s on
//! the record.

pub mod clinical;
pub mod config;
pub mod consultation;
pub mod core;
pub mod generation;
pub mod gp;
pub mod prompt;
pub mod research;
pub mod tool;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use consultation::{
    ClinicalRecord, ClinicalRecordParts, ConsultationId, ConsultationLedger, ConsultationNote,
    ConsultationPair, ConsultationRequest, CounterReferralContent, CounterReferralNote,
    EvidenceLevel, FailureKind, NoteFlag, RecordWarning, SpecialistFailure, SpecialistOutcome,
    Specialty, Urgency,
};
pub use core::{error::DomainError, model::Model, question::Question};
pub use generation::{ContentBlock, GenerationResponse, Message, Role, StopReason};
pub use gp::{GpAction, GpPhase, RejectedCall};
pub use prompt::PromptTemplate;
pub use research::{Correction, ResearchLoopState, SpecialistTurn};
pub use tool::{
    entities::{ToolCall, ToolDefinition, ToolKind, ToolParameter, ToolSpec},
    traits::{DefaultToolValidator, ToolValidator},
    value_objects::{ToolError, ToolResult},
};
