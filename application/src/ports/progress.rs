//! Progress notification port
//!
//! Defines the callbacks used to report progress during a consultation run.

use interconsult_domain::{
    ClinicalRecord, ConsultationId, ConsultationNote, CounterReferralNote, GpPhase,
};

/// Callback for progress updates during a consultation run
///
/// Implementations live in the presentation layer. Every method has a no-op
/// default; specialist callbacks may arrive concurrently and in completion
/// order.
pub trait ConsultationProgressNotifier: Send + Sync {
    /// The GP made a decision in the given phase
    fn on_gp_decision(&self, _phase: GpPhase, _decision: &str) {}

    /// A batch of consultations is about to be dispatched
    fn on_batch_start(&self, _notes: &[ConsultationNote]) {}

    /// A specialist acquired a slot and started researching
    fn on_specialist_start(&self, _note: &ConsultationNote) {}

    /// A specialist invoked a research tool
    fn on_tool_call(&self, _consultation_id: &ConsultationId, _tool_name: &str, _success: bool) {}

    /// A specialist reached a terminal outcome (placeholder notes carry failures)
    fn on_specialist_complete(&self, _note: &ConsultationNote, _reply: &CounterReferralNote) {}

    /// A batch has fully resolved
    fn on_batch_complete(&self, _resolved: usize) {}

    /// A generation call is being retried
    fn on_retry(&self, _label: &str, _attempt: u32, _error: &str) {}

    /// The clinical record has been assembled
    fn on_record_assembled(&self, _record: &ClinicalRecord) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ConsultationProgressNotifier for NoProgress {}
