//! Specialist runner: one research loop inside a wall-clock timeout.

use crate::ports::generation::GenerationGateway;
use crate::use_cases::research_loop::ResearchLoop;
use interconsult_domain::{
    ConsultationNote, FailureKind, SpecialistFailure, SpecialistOutcome,
};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs one specialist with failure isolation.
///
/// The wall-clock timeout is independent of the loop's iteration budget.
/// On timeout the loop future is dropped, which stops it at its current
/// suspension point. Every outcome comes back as data; nothing propagates.
pub struct SpecialistRunner<G: GenerationGateway + 'static> {
    research: ResearchLoop<G>,
    timeout: Duration,
}

impl<G: GenerationGateway + 'static> SpecialistRunner<G> {
    pub fn new(research: ResearchLoop<G>, timeout: Duration) -> Self {
        Self { research, timeout }
    }

    pub async fn run(&self, note: &ConsultationNote, token: &CancellationToken) -> SpecialistOutcome {
        info!(
            consultation_id = %note.consultation_id(),
            specialty = %note.specialty(),
            urgency = %note.urgency(),
            "Specialist started"
        );
        match tokio::time::timeout(self.timeout, self.research.run(note, token)).await {
            Ok(Ok(reply)) => {
                info!(
                    consultation_id = %note.consultation_id(),
                    flags = ?reply.flags(),
                    "Specialist completed"
                );
                SpecialistOutcome::Completed(reply)
            }
            Ok(Err(failure)) => {
                warn!(
                    consultation_id = %note.consultation_id(),
                    "Specialist failed: {}",
                    failure
                );
                SpecialistOutcome::Failed(failure)
            }
            Err(_) => {
                warn!(
                    consultation_id = %note.consultation_id(),
                    timeout_secs = self.timeout.as_secs_f32(),
                    "Specialist timed out"
                );
                SpecialistOutcome::Failed(SpecialistFailure::new(
                    FailureKind::Timeout,
                    format!("exceeded {}s wall-clock limit", self.timeout.as_secs_f32()),
                ))
            }
        }
    }
}
