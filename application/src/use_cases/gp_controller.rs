//! GP controller: the bounded decision state machine of the coordinating agent.
//!
//! | Phase        | Offered actions                         | Outcome                      |
//! |--------------|-----------------------------------------|------------------------------|
//! | Intake       | all four                                 | DirectAnswer or Dispatching  |
//! | Integrating  | ConsultSpecialist, ConsultationComplete | Dispatching or Complete      |
//!
//! Every generation turn counts against `max_gp_iterations`, except
//! `reflect` turns within the reflection budget. Reaching the limit forces
//! termination with a deterministic fallback flagged as incomplete.

use crate::config::EngineConfig;
use crate::ports::generation::{GatewayError, GenerationGateway, GenerationRequest};
use crate::ports::progress::ConsultationProgressNotifier;
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use crate::use_cases::shared::{GenerationFailure, generate_with_retry};
use interconsult_domain::gp::tools::{CONSULTATION_COMPLETE, REFLECT, consultation_complete};
use interconsult_domain::gp::{gp_tool_spec, interpret};
use interconsult_domain::{
    ConsultationLedger, ConsultationPair, ConsultationRequest, DomainError, GpAction, GpPhase,
    Message, PromptTemplate, Question, RecordWarning, ToolCall, ToolSpec,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const NOTED: &str = "Noted.";
const NOT_EXECUTED: &str = "Not executed: another action in this response took priority.";

/// Errors that end the GP's part of a run
#[derive(Error, Debug)]
pub enum GpError {
    #[error("Operation cancelled")]
    Cancelled,

    #[error("GP generation unavailable: {0}")]
    Unavailable(GatewayError),

    #[error(transparent)]
    InvalidState(#[from] DomainError),
}

/// What the GP decided
#[derive(Debug, Clone, PartialEq)]
pub enum GpDecision {
    DirectAnswer {
        answer: String,
    },
    Dispatch {
        requests: Vec<ConsultationRequest>,
    },
    Complete {
        summary: String,
        integrated_response: String,
    },
}

/// The GP's conversation and bookkeeping for one run
#[derive(Debug, Clone)]
pub struct GpSession {
    phase: GpPhase,
    history: Vec<Message>,
    trace: Vec<String>,
    summary_notes: Vec<String>,
    warnings: Vec<RecordWarning>,
    /// Accepted `ConsultSpecialist` calls awaiting their counter-referrals
    pending_calls: Vec<ToolCall>,
    iterations_used: usize,
    reflections: usize,
    incomplete: bool,
}

impl GpSession {
    pub fn phase(&self) -> GpPhase {
        self.phase
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Reflections recorded through `reflect`
    pub fn trace(&self) -> &[String] {
        &self.trace
    }

    /// Notes the engine appends to the GP summary (e.g. truncation)
    pub fn summary_notes(&self) -> &[String] {
        &self.summary_notes
    }

    pub fn warnings(&self) -> &[RecordWarning] {
        &self.warnings
    }

    pub fn iterations_used(&self) -> usize {
        self.iterations_used
    }

    pub fn is_incomplete(&self) -> bool {
        self.incomplete
    }

    fn transition(&mut self, next: GpPhase) -> Result<(), DomainError> {
        self.phase = self.phase.transition(next)?;
        debug!(phase = self.phase.as_str(), "GP phase transition");
        Ok(())
    }

    fn reply(&mut self, call: &ToolCall, content: impl Into<String>) {
        self.history.push(Message::tool(call, content));
    }
}

/// Drives the GP through intake, dispatch decisions and integration.
pub struct GpController<G: GenerationGateway + 'static> {
    gateway: Arc<G>,
    config: Arc<EngineConfig>,
    progress: Arc<dyn ConsultationProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
}

impl<G: GenerationGateway + 'static> GpController<G> {
    pub fn new(
        gateway: Arc<G>,
        config: Arc<EngineConfig>,
        progress: Arc<dyn ConsultationProgressNotifier>,
        logger: Arc<dyn RunEventLogger>,
    ) -> Self {
        Self {
            gateway,
            config,
            progress,
            logger,
        }
    }

    /// Open the GP conversation in Intake
    pub fn start(&self, question: &Question) -> GpSession {
        GpSession {
            phase: GpPhase::Intake,
            history: vec![Message::user(PromptTemplate::gp_intake(question.content()))],
            trace: Vec::new(),
            summary_notes: Vec::new(),
            warnings: Vec::new(),
            pending_calls: Vec::new(),
            iterations_used: 0,
            reflections: 0,
            incomplete: false,
        }
    }

    /// Run GP turns until a decision is reached (Intake or Integrating only).
    pub async fn decide(
        &self,
        session: &mut GpSession,
        ledger: &ConsultationLedger,
        token: &CancellationToken,
    ) -> Result<GpDecision, GpError> {
        let available = &self.config.available_specialties;
        let spec = gp_tool_spec(available);
        let system_prompt =
            PromptTemplate::gp_system(available, self.config.max_specialists_per_consultation);
        session.reflections = 0;

        loop {
            if session.iterations_used >= self.config.max_gp_iterations {
                warn!(
                    limit = self.config.max_gp_iterations,
                    phase = session.phase.as_str(),
                    "GP iteration limit reached, forcing termination"
                );
                session.warnings.push(RecordWarning::GpIterationLimit {
                    limit: self.config.max_gp_iterations,
                });
                if session.phase == GpPhase::Integrating && !ledger.is_empty() {
                    return self.close_integration(session, ledger, token).await;
                }
                return self.force_termination(session, ledger);
            }
            session.iterations_used += 1;

            let request = GenerationRequest::new(self.config.gp_model.clone(), &system_prompt)
                .with_tools(spec.sorted().into_iter().cloned().collect())
                .with_history(session.history.clone());
            let response = match generate_with_retry(
                self.gateway.as_ref(),
                &request,
                &self.config.generation_retry,
                token,
                self.progress.as_ref(),
                "gp",
            )
            .await
            {
                Ok(response) => response,
                Err(GenerationFailure::Cancelled) => return Err(GpError::Cancelled),
                Err(GenerationFailure::Gateway(GatewayError::MalformedOutput(detail))) => {
                    session.history.push(Message::user(format!(
                        "Your previous response could not be read ({}). Respond with one of the available tools.",
                        detail
                    )));
                    continue;
                }
                Err(GenerationFailure::Gateway(e)) if session.phase == GpPhase::Intake => {
                    return Err(GpError::Unavailable(e));
                }
                Err(GenerationFailure::Gateway(e)) => {
                    warn!("GP integration unavailable: {}", e);
                    session.warnings.push(RecordWarning::IntegrationUnavailable {
                        message: e.to_string(),
                    });
                    return self.force_termination(session, ledger);
                }
            };

            let calls = response.tool_calls();
            session
                .history
                .push(Message::assistant(response.text_content(), calls.clone()));
            let action = interpret(&response, session.phase, &spec, available);

            match action {
                GpAction::DirectAnswer { answer } => {
                    session.transition(GpPhase::DirectAnswer)?;
                    self.announce(session, "direct_answer", json!({}));
                    return Ok(GpDecision::DirectAnswer { answer });
                }
                GpAction::Complete {
                    summary,
                    integrated_response,
                } => {
                    session.transition(GpPhase::Complete)?;
                    self.announce(session, "consultation_complete", json!({}));
                    return Ok(GpDecision::Complete {
                        summary,
                        integrated_response,
                    });
                }
                GpAction::Consult {
                    mut requests,
                    calls: mut accepted,
                    rejected,
                } => {
                    let mut replies: Vec<(ToolCall, String)> =
                        rejected.into_iter().map(|r| (r.call, r.reason)).collect();
                    let requested = requests.len();
                    let allowed = self.config.max_specialists_per_consultation;
                    if requested > allowed {
                        warn!(requested, allowed, "Truncating consultation requests");
                        for dropped in accepted.drain(allowed..) {
                            replies.push((
                                dropped,
                                PromptTemplate::capacity_exceeded(requested, allowed),
                            ));
                        }
                        let dropped: Vec<_> = requests
                            .drain(allowed..)
                            .map(|r| r.specialty.as_str())
                            .collect();
                        session.summary_notes.push(format!(
                            "Consultation requests truncated: {} requested, {} dispatched (not consulted: {}).",
                            requested,
                            allowed,
                            dropped.join(", ")
                        ));
                        session.warnings.push(RecordWarning::ConsultationsTruncated {
                            requested,
                            dispatched: allowed,
                        });
                    }
                    self.reply_to_others(session, &spec, &calls, &accepted, &replies);
                    session.pending_calls = accepted;
                    session.transition(GpPhase::Dispatching)?;
                    let specialties: Vec<_> = requests.iter().map(|r| r.specialty).collect();
                    self.announce(session, "consult", json!({ "specialties": specialties }));
                    return Ok(GpDecision::Dispatch { requests });
                }
                GpAction::Reflect { .. } => {
                    self.reply_to_others(session, &spec, &calls, &[], &[]);
                    session.reflections += 1;
                    if session.reflections <= self.config.max_research_iterations {
                        // Reflection within budget is free
                        session.iterations_used -= 1;
                    } else {
                        session.history.push(Message::user(
                            "Reflection budget for this decision is spent. Decide now with ConsultSpecialist, ConsultationComplete or DirectAnswer.",
                        ));
                    }
                    self.progress.on_gp_decision(session.phase, "reflect");
                }
                GpAction::Unusable { rejected } => {
                    let replies: Vec<(ToolCall, String)> =
                        rejected.into_iter().map(|r| (r.call, r.reason)).collect();
                    let detail = replies
                        .iter()
                        .map(|(_, reason)| reason.as_str())
                        .collect::<Vec<_>>()
                        .join("; ");
                    self.reply_to_others(session, &spec, &calls, &[], &replies);
                    session.history.push(Message::user(format!(
                        "No usable action was found in your response{}. Use one of the available tools.",
                        if detail.is_empty() {
                            String::new()
                        } else {
                            format!(" ({})", detail)
                        }
                    )));
                    self.announce(session, "unusable", json!({ "reasons": detail }));
                }
            }
        }
    }

    /// Mark the dispatched batch as in flight
    pub fn begin_batch(&self, session: &mut GpSession) -> Result<(), GpError> {
        session.transition(GpPhase::AwaitingSpecialists)?;
        Ok(())
    }

    /// Deliver a resolved batch to the GP and move to Integrating.
    ///
    /// Each accepted `ConsultSpecialist` call receives its counter-referral
    /// as the call's result; `pairs` is in the same order as the calls.
    pub fn deliver_batch(
        &self,
        session: &mut GpSession,
        pairs: &[ConsultationPair],
    ) -> Result<(), GpError> {
        let pending = std::mem::take(&mut session.pending_calls);
        for (call, pair) in pending.iter().zip(pairs) {
            session.reply(call, PromptTemplate::counter_referral_summary(pair));
        }
        let remaining = self
            .config
            .max_gp_iterations
            .saturating_sub(session.iterations_used);
        session
            .history
            .push(Message::user(PromptTemplate::gp_integrate(remaining)));
        session.transition(GpPhase::Integrating)?;
        Ok(())
    }

    /// Close a run cancelled while specialists were in flight
    pub fn complete_cancelled(
        &self,
        session: &mut GpSession,
        ledger: &ConsultationLedger,
    ) -> Result<GpDecision, GpError> {
        session.warnings.push(RecordWarning::RunCancelled);
        session.pending_calls.clear();
        session.incomplete = true;
        session.transition(GpPhase::Complete)?;
        Ok(GpDecision::Complete {
            summary: "Run cancelled before the GP could integrate the counter-referrals."
                .to_string(),
            integrated_response: fallback_integration(ledger),
        })
    }

    /// One last integration turn once the decision budget is spent.
    ///
    /// Only `ConsultationComplete` is offered. Anything other than a
    /// completion falls back to the ledger text. The run stays incomplete.
    async fn close_integration(
        &self,
        session: &mut GpSession,
        ledger: &ConsultationLedger,
        token: &CancellationToken,
    ) -> Result<GpDecision, GpError> {
        session
            .history
            .push(Message::user(PromptTemplate::gp_conclude_now()));
        let system_prompt = PromptTemplate::gp_system(
            &self.config.available_specialties,
            self.config.max_specialists_per_consultation,
        );
        let request = GenerationRequest::new(self.config.gp_model.clone(), &system_prompt)
            .with_tools(vec![consultation_complete()])
            .with_history(session.history.clone());

        let response = match generate_with_retry(
            self.gateway.as_ref(),
            &request,
            &self.config.generation_retry,
            token,
            self.progress.as_ref(),
            "gp",
        )
        .await
        {
            Ok(response) => response,
            Err(GenerationFailure::Cancelled) => return Err(GpError::Cancelled),
            Err(GenerationFailure::Gateway(e)) => {
                warn!("Closing integration failed: {}", e);
                return self.force_termination(session, ledger);
            }
        };

        session
            .history
            .push(Message::assistant(response.text_content(), response.tool_calls()));
        let spec = ToolSpec::new()
            .register(consultation_complete())
            .register_alias("consultation_complete", CONSULTATION_COMPLETE);
        match interpret(&response, session.phase, &spec, &self.config.available_specialties) {
            GpAction::Complete {
                summary,
                integrated_response,
            } => {
                session.incomplete = true;
                session.summary_notes.push(format!(
                    "Decision limit of {} rounds reached; the GP integrated without further consultations.",
                    self.config.max_gp_iterations
                ));
                session.transition(GpPhase::Complete)?;
                self.announce(session, "closing_complete", json!({}));
                Ok(GpDecision::Complete {
                    summary,
                    integrated_response,
                })
            }
            _ => {
                warn!("Closing integration produced no completion");
                self.force_termination(session, ledger)
            }
        }
    }

    /// Deterministic termination without another generation call
    fn force_termination(
        &self,
        session: &mut GpSession,
        ledger: &ConsultationLedger,
    ) -> Result<GpDecision, GpError> {
        session.incomplete = true;
        if session.phase == GpPhase::Intake {
            session.transition(GpPhase::DirectAnswer)?;
            self.announce(session, "forced_direct_answer", json!({}));
            return Ok(GpDecision::DirectAnswer {
                answer: "The GP could not reach a decision for this question. No answer is available."
                    .to_string(),
            });
        }
        session.transition(GpPhase::Complete)?;
        self.announce(session, "forced_complete", json!({}));
        Ok(GpDecision::Complete {
            summary: format!(
                "Integration incomplete: the GP did not conclude within {} decision rounds. \
The response below is assembled from the counter-referrals.",
                self.config.max_gp_iterations
            ),
            integrated_response: fallback_integration(ledger),
        })
    }

    /// Answer every call in the response that is not awaiting a batch
    fn reply_to_others(
        &self,
        session: &mut GpSession,
        spec: &ToolSpec,
        calls: &[ToolCall],
        pending: &[ToolCall],
        replies: &[(ToolCall, String)],
    ) {
        for call in calls {
            if pending.contains(call) {
                continue;
            }
            if let Some((_, reason)) = replies.iter().find(|(c, _)| c == call) {
                session.reply(call, reason.clone());
            } else if spec.resolve(&call.tool_name) == Some(REFLECT) {
                let thought = call.get_string("thought").unwrap_or_default().trim();
                if !thought.is_empty() {
                    session
                        .trace
                        .push(format!("[{}] {}", session.phase.as_str(), thought));
                }
                session.reply(call, NOTED);
            } else {
                session.reply(call, NOT_EXECUTED);
            }
        }
    }

    fn announce(&self, session: &GpSession, decision: &str, details: serde_json::Value) {
        info!(
            decision,
            phase = session.phase.as_str(),
            iteration = session.iterations_used,
            "GP decision"
        );
        self.progress.on_gp_decision(session.phase, decision);
        self.logger.log(RunEvent::new(
            "gp_decision",
            json!({
                "decision": decision,
                "phase": session.phase,
                "iteration": session.iterations_used,
                "details": details,
            }),
        ));
    }
}

/// Integrated response built from the ledger when the GP could not integrate
fn fallback_integration(ledger: &ConsultationLedger) -> String {
    if ledger.is_empty() {
        return "No counter-referrals were available.".to_string();
    }
    ledger
        .pairs()
        .iter()
        .map(|pair| {
            let note = pair.consultation();
            let reply = pair.counter_referral();
            let header = format!(
                "{} ({})",
                note.specialty().display_name(),
                note.consultation_id()
            );
            match reply.failure() {
                Some(failure) => format!("{}: no answer ({}).", header, failure),
                None => format!(
                    "{}: {}\nRecommendations: {}",
                    header,
                    reply.clinical_assessment(),
                    reply.recommendations()
                ),
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
