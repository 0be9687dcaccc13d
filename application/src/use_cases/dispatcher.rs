//! Consultation dispatcher: concurrent fan-out of one batch, fan-in in request order.

use crate::ports::generation::GenerationGateway;
use crate::ports::progress::ConsultationProgressNotifier;
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use crate::use_cases::run_state::RunState;
use crate::use_cases::specialist_runner::SpecialistRunner;
use interconsult_domain::{
    ConsultationNote, CounterReferralNote, FailureKind, SpecialistFailure, SpecialistOutcome,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Launches one specialist runner per note and waits for all of them.
///
/// - Concurrency is bounded by the run's semaphore; excess notes queue.
/// - Outcomes are returned in note order, whatever the completion order.
/// - A failing specialist never cancels its siblings.
/// - When the run token is cancelled, running specialists stop at their next
///   suspension point. Finished outcomes are kept; every other slot comes
///   back as a cancellation failure.
pub struct ConsultationDispatcher<G: GenerationGateway + 'static> {
    runner: Arc<SpecialistRunner<G>>,
    progress: Arc<dyn ConsultationProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
}

impl<G: GenerationGateway + 'static> ConsultationDispatcher<G> {
    pub fn new(
        runner: Arc<SpecialistRunner<G>>,
        progress: Arc<dyn ConsultationProgressNotifier>,
        logger: Arc<dyn RunEventLogger>,
    ) -> Self {
        Self {
            runner,
            progress,
            logger,
        }
    }

    pub async fn dispatch(
        &self,
        notes: &[ConsultationNote],
        run: &RunState,
    ) -> Vec<SpecialistOutcome> {
        info!(batch = notes.len(), "Dispatching consultations");
        self.progress.on_batch_start(notes);

        let mut join_set = JoinSet::new();
        let mut slots_by_task = HashMap::new();

        for (slot, note) in notes.iter().enumerate() {
            self.logger.log(RunEvent::new(
                "consultation_dispatched",
                json!({
                    "consultation_id": note.consultation_id(),
                    "specialty": note.specialty(),
                    "urgency": note.urgency(),
                    "clinical_question": note.clinical_question(),
                }),
            ));

            let runner = Arc::clone(&self.runner);
            let progress = Arc::clone(&self.progress);
            let logger = Arc::clone(&self.logger);
            let semaphore = run.semaphore();
            let token = run.token().child_token();
            let note = note.clone();

            let handle = join_set.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(SpecialistFailure::cancelled()),
                    permit = semaphore.acquire_owned() => permit.map_err(|_| {
                        SpecialistFailure::new(FailureKind::Internal, "concurrency limiter closed")
                    }),
                };
                let outcome = match &permit {
                    Ok(_) => {
                        progress.on_specialist_start(&note);
                        runner.run(&note, &token).await
                    }
                    Err(failure) => SpecialistOutcome::Failed(failure.clone()),
                };
                // Reported while the slot is still held
                report(progress.as_ref(), logger.as_ref(), &note, &outcome);
                drop(permit);
                (slot, outcome)
            });
            slots_by_task.insert(handle.id(), slot);
        }

        let mut outcomes: Vec<Option<SpecialistOutcome>> = notes.iter().map(|_| None).collect();
        let mut aborted = false;

        loop {
            let joined = if aborted {
                join_set.join_next_with_id().await
            } else {
                tokio::select! {
                    biased;
                    _ = run.token().cancelled() => {
                        warn!("Run cancelled, stopping outstanding specialists");
                        join_set.abort_all();
                        aborted = true;
                        continue;
                    }
                    joined = join_set.join_next_with_id() => joined,
                }
            };
            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((_, (slot, outcome))) => outcomes[slot] = Some(outcome),
                Err(e) => {
                    let Some(&slot) = slots_by_task.get(&e.id()) else {
                        warn!("Join error for unknown specialist task: {}", e);
                        continue;
                    };
                    let failure = if e.is_cancelled() {
                        SpecialistFailure::cancelled()
                    } else {
                        SpecialistFailure::new(
                            FailureKind::Internal,
                            format!("specialist task panicked: {}", e),
                        )
                    };
                    let outcome = SpecialistOutcome::Failed(failure);
                    report(
                        self.progress.as_ref(),
                        self.logger.as_ref(),
                        &notes[slot],
                        &outcome,
                    );
                    outcomes[slot] = Some(outcome);
                }
            }
        }

        let resolved: Vec<SpecialistOutcome> = outcomes
            .into_iter()
            .map(|outcome| {
                outcome.unwrap_or_else(|| SpecialistOutcome::Failed(SpecialistFailure::cancelled()))
            })
            .collect();
        debug!(resolved = resolved.len(), "Batch resolved");
        self.progress.on_batch_complete(resolved.len());
        resolved
    }
}

/// Emit progress and transcript events for one terminal outcome
fn report(
    progress: &dyn ConsultationProgressNotifier,
    logger: &dyn RunEventLogger,
    note: &ConsultationNote,
    outcome: &SpecialistOutcome,
) {
    let reply = match outcome {
        SpecialistOutcome::Completed(reply) => {
            logger.log(RunEvent::new(
                "specialist_completed",
                json!({
                    "consultation_id": note.consultation_id(),
                    "specialty": note.specialty(),
                    "evidence_used": reply.evidence_used(),
                    "evidence_level": reply.evidence_level(),
                    "flags": reply.flags(),
                }),
            ));
            reply.clone()
        }
        SpecialistOutcome::Failed(failure) => {
            logger.log(RunEvent::new(
                "specialist_failed",
                json!({
                    "consultation_id": note.consultation_id(),
                    "specialty": note.specialty(),
                    "failure": failure.kind,
                    "message": failure.message,
                }),
            ));
            CounterReferralNote::failure_placeholder(note, failure.clone())
        }
    };
    progress.on_specialist_complete(note, &reply);
}
