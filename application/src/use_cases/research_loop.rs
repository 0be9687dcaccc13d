//! Research loop: one specialist's bounded think → call tool → observe cycle.
//!
//! ```text
//!            ┌──────────── observation ◀── ToolRouter ◀──┐
//!            ▼                                            │
//! note ─▶ generate ─▶ research calls ─────────────────────┘
//!            │
//!            ├─▶ submit_counter_referral ─▶ validate ─▶ CounterReferralNote
//!            │                                 │ (citations missing: one correction)
//!            └─▶ free text ─▶ one format correction
//!
//! budget exhausted ─▶ conclude-now generation (submit tool only) ─▶ flagged note
//! ```

use crate::config::EngineConfig;
use crate::ports::generation::{GatewayError, GenerationGateway, GenerationRequest};
use crate::ports::progress::ConsultationProgressNotifier;
use crate::ports::run_event_logger::{RunEvent, RunEventLogger};
use crate::use_cases::shared::{GenerationFailure, check_cancelled, generate_with_retry};
use crate::use_cases::tool_router::ToolRouter;
use interconsult_domain::core::string::truncate;
use interconsult_domain::research::terminal::submit_counter_referral;
use interconsult_domain::research::classify;
use interconsult_domain::{
    ConsultationNote, Correction, CounterReferralContent, CounterReferralNote, FailureKind,
    GenerationResponse, Message, NoteFlag, PromptTemplate, ResearchLoopState, SpecialistFailure,
    SpecialistTurn, ToolCall, ToolDefinition, ToolSpec,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const LAST_RESORT_ASSESSMENT: &str =
    "The research budget was exhausted before the specialist reached a conclusion.";
const LAST_RESORT_RECOMMENDATIONS: &str =
    "No specialist recommendation could be formulated; consider re-consulting with more context.";

/// Drives one specialist's research loop.
///
/// The loop state lives only inside [`ResearchLoop::run`]; nothing is shared
/// with sibling specialists except the stateless router and gateway.
pub struct ResearchLoop<G: GenerationGateway + 'static> {
    gateway: Arc<G>,
    router: Arc<ToolRouter>,
    config: Arc<EngineConfig>,
    progress: Arc<dyn ConsultationProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
}

impl<G: GenerationGateway + 'static> ResearchLoop<G> {
    pub fn new(
        gateway: Arc<G>,
        router: Arc<ToolRouter>,
        config: Arc<EngineConfig>,
        progress: Arc<dyn ConsultationProgressNotifier>,
        logger: Arc<dyn RunEventLogger>,
    ) -> Self {
        Self {
            gateway,
            router,
            config,
            progress,
            logger,
        }
    }

    /// Run the loop to a terminal counter-referral or a failure.
    pub async fn run(
        &self,
        note: &ConsultationNote,
        token: &CancellationToken,
    ) -> Result<CounterReferralNote, SpecialistFailure> {
        let specialty = note.specialty();
        let research_spec = self.router.spec_for(specialty);
        let mut offered: Vec<ToolDefinition> =
            research_spec.sorted().into_iter().cloned().collect();
        offered.push(submit_counter_referral());
        let system_prompt =
            PromptTemplate::specialist_system(specialty, self.config.require_citations);

        let mut state = ResearchLoopState::new(
            Message::user(PromptTemplate::consultation_note(note)),
            self.config.max_research_iterations,
        );

        loop {
            if state.is_exhausted() {
                return self.conclude(note, &system_prompt, &mut state, token).await;
            }
            let iteration = state.begin_iteration();
            debug!(
                consultation_id = %note.consultation_id(),
                specialty = %specialty,
                iteration,
                "Research iteration"
            );

            let request = GenerationRequest::new(self.config.specialist_model.clone(), &system_prompt)
                .with_tools(offered.clone())
                .with_history(state.history().to_vec());
            let response = match self.generate(note, &request, token).await {
                Ok(response) => response,
                Err(GenerationFailure::Cancelled) => return Err(SpecialistFailure::cancelled()),
                Err(GenerationFailure::Gateway(GatewayError::MalformedOutput(detail))) => {
                    if state.grant_correction(Correction::Format, &detail) {
                        continue;
                    }
                    return Err(SpecialistFailure::new(FailureKind::MalformedOutput, detail));
                }
                Err(GenerationFailure::Gateway(e)) => {
                    return Err(SpecialistFailure::new(
                        FailureKind::GenerationUnavailable,
                        e.to_string(),
                    ));
                }
            };

            match classify(&response) {
                SpecialistTurn::Submission { call, content } => {
                    state.record_turn(response.text_content(), response.tool_calls());
                    for other in response.tool_calls() {
                        if other.native_id != call.native_id {
                            state.record_rejection(&other, PromptTemplate::ignored_with_submission());
                        }
                    }
                    let content = match content {
                        Ok(content) => content,
                        Err(detail) => {
                            state.record_rejection(&call, &format!("Rejected: {}", detail));
                            if state.grant_correction(Correction::Format, &detail) {
                                continue;
                            }
                            return Err(SpecialistFailure::new(FailureKind::MalformedOutput, detail));
                        }
                    };
                    if self.config.require_citations && content.evidence_used.is_empty() {
                        state.record_rejection(&call, "Rejected: evidence_used is empty");
                        if state.grant_correction(Correction::Citations, "") {
                            info!(
                                consultation_id = %note.consultation_id(),
                                "Counter-referral without citations, granting one correction"
                            );
                            continue;
                        }
                        warn!(
                            consultation_id = %note.consultation_id(),
                            "Accepting counter-referral without citations"
                        );
                        return Ok(self.finalize(note, content, &[NoteFlag::CitationsMissing]));
                    }
                    return Ok(self.finalize(note, content, &[]));
                }
                SpecialistTurn::Research(calls) => {
                    state.record_turn(response.text_content(), calls.clone());
                    for call in &calls {
                        self.observe(note, call, &research_spec, &mut state, token)
                            .await?;
                    }
                }
                SpecialistTurn::FreeText(text) => {
                    state.record_turn(&text, Vec::new());
                    if !state.grant_correction(Correction::Format, "free text is not a counter-referral") {
                        return self.conclude(note, &system_prompt, &mut state, token).await;
                    }
                }
                SpecialistTurn::Empty => {
                    if !state.grant_correction(Correction::Format, "the response was empty") {
                        return self.conclude(note, &system_prompt, &mut state, token).await;
                    }
                }
            }
        }
    }

    /// Route one research call and append its result to the history
    async fn observe(
        &self,
        note: &ConsultationNote,
        call: &ToolCall,
        spec: &ToolSpec,
        state: &mut ResearchLoopState,
        token: &CancellationToken,
    ) -> Result<(), SpecialistFailure> {
        check_cancelled(token).map_err(|_| SpecialistFailure::cancelled())?;
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(SpecialistFailure::cancelled()),
            result = self.router.route(call, note.specialty(), spec) => result,
        };
        self.progress
            .on_tool_call(note.consultation_id(), &call.tool_name, result.is_success());
        self.logger.log(RunEvent::new(
            "tool_call",
            json!({
                "consultation_id": note.consultation_id(),
                "specialty": note.specialty(),
                "tool": call.tool_name,
                "arguments": call.arguments,
                "success": result.is_success(),
                "duration_ms": result.duration_ms,
                "observation": truncate(&result.to_observation(), 500),
            }),
        ));
        state.record_observation(call, &result);
        Ok(())
    }

    /// Forced terminal generation once the budget is spent
    async fn conclude(
        &self,
        note: &ConsultationNote,
        system_prompt: &str,
        state: &mut ResearchLoopState,
        token: &CancellationToken,
    ) -> Result<CounterReferralNote, SpecialistFailure> {
        info!(
            consultation_id = %note.consultation_id(),
            iterations = state.iterations_used(),
            failed_tools = state.failed_tool_calls(),
            "Research budget exhausted, forcing conclusion"
        );
        state.push_instruction(PromptTemplate::conclude_now());
        let request = GenerationRequest::new(self.config.specialist_model.clone(), system_prompt)
            .with_tools(vec![submit_counter_referral()])
            .with_history(state.history().to_vec());

        let response = match self.generate(note, &request, token).await {
            Ok(response) => response,
            Err(GenerationFailure::Cancelled) => return Err(SpecialistFailure::cancelled()),
            Err(GenerationFailure::Gateway(e)) => {
                return Err(SpecialistFailure::new(
                    FailureKind::GenerationUnavailable,
                    format!("forced conclusion failed: {}", e),
                ));
            }
        };

        let content = match classify(&response) {
            SpecialistTurn::Submission { content: Ok(content), .. } => content,
            SpecialistTurn::Submission { .. } => last_resort(response.text_content()),
            SpecialistTurn::FreeText(text) => last_resort(text),
            SpecialistTurn::Research(_) | SpecialistTurn::Empty => last_resort(String::new()),
        };

        let mut flags = vec![NoteFlag::BudgetExhausted];
        if self.config.require_citations && content.evidence_used.is_empty() {
            flags.push(NoteFlag::CitationsMissing);
        }
        Ok(self.finalize(note, content, &flags))
    }

    async fn generate(
        &self,
        note: &ConsultationNote,
        request: &GenerationRequest,
        token: &CancellationToken,
    ) -> Result<GenerationResponse, GenerationFailure> {
        let label = format!("{} {}", note.specialty().as_str(), note.consultation_id());
        generate_with_retry(
            self.gateway.as_ref(),
            request,
            &self.config.generation_retry,
            token,
            self.progress.as_ref(),
            &label,
        )
        .await
    }

    /// Build the accepted note, adding the evidence-level flag when below minimum
    fn finalize(
        &self,
        note: &ConsultationNote,
        content: CounterReferralContent,
        flags: &[NoteFlag],
    ) -> CounterReferralNote {
        let below_minimum = match (content.evidence_level, self.config.min_evidence_level) {
            (Some(level), Some(minimum)) => !level.meets(minimum),
            _ => false,
        };
        let mut reply = CounterReferralNote::answering(note, content);
        for flag in flags {
            reply = reply.with_flag(*flag);
        }
        if below_minimum {
            reply = reply.with_flag(NoteFlag::EvidenceBelowMinimum);
        }
        reply
    }
}

/// Content used when the forced conclusion produced no valid submission
fn last_resort(text: String) -> CounterReferralContent {
    let text = text.trim();
    CounterReferralContent {
        clinical_assessment: if text.is_empty() {
            LAST_RESORT_ASSESSMENT.to_string()
        } else {
            text.to_string()
        },
        recommendations: LAST_RESORT_RECOMMENDATIONS.to_string(),
        ..Default::default()
    }
}
