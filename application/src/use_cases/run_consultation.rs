//! Run Consultation use case
//!
//! Orchestrates one interconsultation run:
//! 1. Intake - the GP answers directly or requests consultations
//! 2. Dispatch - the batch runs concurrently, one isolated research loop per specialist
//! 3. Integration - counter-referrals go back to the GP, who completes or asks again
//! 4. Assembly - the ledger and the GP's integration become the clinical record

use crate::config::EngineConfig;
use crate::ports::generation::{GatewayError, GenerationGateway};
use crate::ports::progress::{ConsultationProgressNotifier, NoProgress};
use crate::ports::run_event_logger::{NoRunEventLogger, RunEvent, RunEventLogger};
use crate::use_cases::assemble_record::{ClinicalRecordAssembler, RecordDraft};
use crate::use_cases::dispatcher::ConsultationDispatcher;
use crate::use_cases::gp_controller::{GpController, GpDecision, GpError, GpSession};
use crate::use_cases::research_loop::ResearchLoop;
use crate::use_cases::run_state::RunState;
use crate::use_cases::specialist_runner::SpecialistRunner;
use crate::use_cases::tool_router::ToolRouter;
use interconsult_domain::{
    ClinicalRecord, ConfigIssue, ConsultationLedger, ConsultationNote, DomainError, GpPhase,
    Question,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const DIRECT_ANSWER_SUMMARY: &str = "Answered directly by the GP without specialist consultation.";

/// Fatal errors of a run; everything else ends up inside the record
#[derive(Error, Debug)]
pub enum RunConsultationError {
    #[error("Invalid configuration: {}", format_issues(.0))]
    InvalidConfig(Vec<ConfigIssue>),

    #[error("No specialties configured but consultation is mandatory")]
    NoSpecialtiesConfigured,

    #[error("Run cancelled before the GP reached a decision")]
    Cancelled,

    #[error("Gateway error: {0}")]
    Gateway(GatewayError),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .filter(|issue| issue.is_error())
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<GpError> for RunConsultationError {
    fn from(error: GpError) -> Self {
        match error {
            GpError::Cancelled => RunConsultationError::Cancelled,
            GpError::Unavailable(e) => RunConsultationError::Gateway(e),
            GpError::InvalidState(e) => RunConsultationError::Domain(e),
        }
    }
}

/// Use case for running a clinical interconsultation
pub struct RunConsultationUseCase<G: GenerationGateway + 'static> {
    gateway: Arc<G>,
    router: Arc<ToolRouter>,
    config: Arc<EngineConfig>,
    progress: Arc<dyn ConsultationProgressNotifier>,
    logger: Arc<dyn RunEventLogger>,
    cancellation: Option<CancellationToken>,
}

impl<G: GenerationGateway + 'static> RunConsultationUseCase<G> {
    pub fn new(gateway: Arc<G>, router: Arc<ToolRouter>, config: EngineConfig) -> Self {
        Self {
            gateway,
            router,
            config: Arc::new(config),
            progress: Arc::new(NoProgress),
            logger: Arc::new(NoRunEventLogger),
            cancellation: None,
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ConsultationProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_event_logger(mut self, logger: Arc<dyn RunEventLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Token the caller raises to cancel the run (e.g. on Ctrl-C)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one consultation to a clinical record.
    pub async fn execute(&self, question: &Question) -> Result<ClinicalRecord, RunConsultationError> {
        if self.config.available_specialties.is_empty() && self.config.consultation_mandatory {
            return Err(RunConsultationError::NoSpecialtiesConfigured);
        }
        let issues = self.config.validate();
        if ConfigIssue::any_errors(&issues) {
            return Err(RunConsultationError::InvalidConfig(issues));
        }
        for issue in issues.iter().filter(|i| !i.is_error()) {
            warn!("{}", issue);
        }

        let token = self
            .cancellation
            .as_ref()
            .map(CancellationToken::child_token)
            .unwrap_or_default();
        let deadline = self.config.run_timeout.map(|limit| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(limit) => {
                        warn!("Run exceeded its {}s limit, cancelling", limit.as_secs_f32());
                        token.cancel();
                    }
                }
            })
        });

        let result = self.run(question, token).await;
        if let Some(deadline) = deadline {
            deadline.abort();
        }
        result
    }

    async fn run(
        &self,
        question: &Question,
        token: CancellationToken,
    ) -> Result<ClinicalRecord, RunConsultationError> {
        let case_id = format!("case-{}", uuid::Uuid::new_v4().simple());
        info!(case_id = %case_id, specialties = self.config.available_specialties.len(), "Starting consultation run");

        let gp = GpController::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.config),
            Arc::clone(&self.progress),
            Arc::clone(&self.logger),
        );
        let dispatcher = self.dispatcher();
        let mut run = RunState::new(
            case_id.clone(),
            self.config.max_concurrent_consultations,
            token.clone(),
        );
        let mut ledger = ConsultationLedger::new();
        let mut session = gp.start(question);

        let mut forced: Option<GpDecision> = None;
        let (gp_summary, integrated_response) = loop {
            let decision = match forced.take() {
                Some(decision) => decision,
                None => match gp.decide(&mut session, &ledger, &token).await {
                    Ok(decision) => decision,
                    Err(GpError::Cancelled) if session.phase() != GpPhase::Intake => {
                        gp.complete_cancelled(&mut session, &ledger)?
                    }
                    Err(e) => return Err(e.into()),
                },
            };

            match decision {
                GpDecision::DirectAnswer { answer } => {
                    break (DIRECT_ANSWER_SUMMARY.to_string(), answer);
                }
                GpDecision::Complete {
                    summary,
                    integrated_response,
                } => break (summary, integrated_response),
                GpDecision::Dispatch { requests } => {
                    let notes: Vec<ConsultationNote> = requests
                        .into_iter()
                        .map(|request| run.open_consultation(request))
                        .collect();
                    gp.begin_batch(&mut session)?;
                    let outcomes = dispatcher.dispatch(&notes, &run).await;
                    let pairs: Vec<_> = notes
                        .into_iter()
                        .zip(outcomes)
                        .map(|(note, outcome)| run.resolve(note, outcome))
                        .collect();
                    for pair in &pairs {
                        ledger.append(pair.clone());
                    }

                    if run.is_cancelled() {
                        warn!(case_id = %case_id, "Run cancelled during dispatch");
                        forced = Some(gp.complete_cancelled(&mut session, &ledger)?);
                        continue;
                    }
                    gp.deliver_batch(&mut session, &pairs)?;
                }
            }
        };

        let record = self.assemble(case_id, question, gp_summary, integrated_response, session, ledger);
        info!(
            case_id = %record.case_id(),
            consultations = record.consultations().len(),
            warnings = record.warnings().len(),
            incomplete = record.is_incomplete(),
            "Clinical record assembled"
        );
        self.logger.log(RunEvent::new(
            "record_assembled",
            json!({
                "case_id": record.case_id(),
                "consultations": record.consultations().len(),
                "citations_satisfied": record.citations_satisfied(),
                "incomplete": record.is_incomplete(),
                "warnings": record.warnings(),
            }),
        ));
        self.progress.on_record_assembled(&record);
        Ok(record)
    }

    fn dispatcher(&self) -> ConsultationDispatcher<G> {
        let research = ResearchLoop::new(
            Arc::clone(&self.gateway),
            Arc::clone(&self.router),
            Arc::clone(&self.config),
            Arc::clone(&self.progress),
            Arc::clone(&self.logger),
        );
        let runner = SpecialistRunner::new(research, self.config.specialist_timeout);
        ConsultationDispatcher::new(
            Arc::new(runner),
            Arc::clone(&self.progress),
            Arc::clone(&self.logger),
        )
    }

    fn assemble(
        &self,
        case_id: String,
        question: &Question,
        gp_summary: String,
        integrated_response: String,
        session: GpSession,
        ledger: ConsultationLedger,
    ) -> ClinicalRecord {
        let draft = RecordDraft {
            case_id,
            original_question: question.content().to_string(),
            gp_summary,
            summary_notes: session.summary_notes().to_vec(),
            integrated_response,
            gp_trace: session.trace().to_vec(),
            warnings: session.warnings().to_vec(),
            incomplete: session.is_incomplete(),
        };
        ClinicalRecordAssembler::from_config(&self.config).assemble(draft, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::use_cases::shared::test_support::{
        Scripted, ScriptedGateway, StaticCapability, complete, consult, submission,
    };
    use interconsult_domain::{
        ConfigIssueCode, FailureKind, RecordWarning, Specialty, ToolCall,
    };
    use std::time::Duration;

    const GP: &str = "coordinating a clinical interconsultation";
    const CARDIOLOGY: &str = "cardiology specialist";
    const NEUROLOGY: &str = "neurology specialist";
    const PHARMACOLOGY: &str = "pharmacology specialist";

    fn config() -> EngineConfig {
        EngineConfig::default()
            .with_max_research_iterations(3)
            .with_generation_retry(RetryPolicy::none())
    }

    fn use_case(
        gateway: ScriptedGateway,
        router: ToolRouter,
        config: EngineConfig,
    ) -> RunConsultationUseCase<ScriptedGateway> {
        RunConsultationUseCase::new(Arc::new(gateway), Arc::new(router), config)
    }

    fn router() -> ToolRouter {
        ToolRouter::new(Duration::from_secs(1))
    }

    fn question() -> Question {
        Question::try_new("Patient with atrial fibrillation, assess stroke risk").unwrap()
    }

    fn cited() -> Scripted {
        Scripted::Calls(vec![submission(&["2020 ESC AF Guidelines"])])
    }

    #[tokio::test]
    async fn test_atrial_fibrillation_scenario() {
        let chads = StaticCapability::ok("calculate_chads2vasc", "CHA2DS2-VASc score: 4 (high risk)");
        let router = router().with_capability(chads.clone());
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![
                    Scripted::Calls(vec![consult("cardiology", "Assess stroke risk")]),
                    Scripted::Calls(vec![complete("Cardiology consulted", "Start a DOAC")]),
                ],
            )
            .script(
                CARDIOLOGY,
                vec![
                    Scripted::Calls(vec![
                        ToolCall::new("calculate_chads2vasc").with_arg("age", 72)
                    ]),
                    cited(),
                ],
            );

        let record = use_case(gateway, router, config()).execute(&question()).await.unwrap();

        assert_eq!(chads.call_count(), 1);
        assert_eq!(record.consultations().len(), 1);
        let pair = &record.consultations()[0];
        assert_eq!(pair.consultation().consultation_id().as_str(), "C-001");
        assert_eq!(pair.counter_referral().evidence_used(), &["2020 ESC AF Guidelines".to_string()]);
        assert!(record.citations_satisfied());
        assert!(record.warnings().is_empty());
        assert!(!record.is_incomplete());
        assert_eq!(record.integrated_response(), "Start a DOAC");
        assert!(record.case_id().starts_with("case-"));
    }

    #[tokio::test]
    async fn test_excess_requests_truncated() {
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![
                    Scripted::Calls(vec![
                        consult("cardiology", "a"),
                        consult("neurology", "b"),
                        consult("internal_medicine", "c"),
                    ]),
                    Scripted::Calls(vec![complete("Two specialists consulted", "Integrated")]),
                ],
            )
            .script(CARDIOLOGY, vec![cited()])
            .script(NEUROLOGY, vec![cited()]);

        let record = use_case(gateway, router(), config().with_max_specialists(2))
            .execute(&question())
            .await
            .unwrap();

        let specialties: Vec<_> = record
            .consultations()
            .iter()
            .map(|p| p.consultation().specialty())
            .collect();
        assert_eq!(specialties, vec![Specialty::Cardiology, Specialty::Neurology]);
        assert!(record.gp_summary().contains("truncated"));
        assert!(record.warnings().contains(&RecordWarning::ConsultationsTruncated {
            requested: 3,
            dispatched: 2
        }));
    }

    #[tokio::test]
    async fn test_one_specialist_timeout_still_produces_record() {
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![
                    Scripted::Calls(vec![consult("cardiology", "a"), consult("neurology", "b")]),
                    Scripted::Calls(vec![complete("Neurology answered", "Integrated")]),
                ],
            )
            .script(
                CARDIOLOGY,
                vec![Scripted::Delayed(Duration::from_secs(5), Box::new(cited()))],
            )
            .script(NEUROLOGY, vec![cited()]);
        let config = config().with_specialist_timeout(Duration::from_millis(200));

        let record = use_case(gateway, router(), config).execute(&question()).await.unwrap();

        assert_eq!(record.consultations().len(), 2);
        let first = record.consultations()[0].counter_referral();
        assert_eq!(first.failure().map(|f| f.kind), Some(FailureKind::Timeout));
        assert!(!record.consultations()[1].counter_referral().is_failure());
        assert!(matches!(
            record.warnings(),
            [RecordWarning::SpecialistFailed {
                failure: FailureKind::Timeout,
                ..
            }]
        ));
        assert!(!record.is_incomplete());
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let gateway = ScriptedGateway::new().script(
            GP,
            vec![Scripted::Text("Ferritin below 30 ng/mL confirms iron deficiency.".to_string())],
        );

        let record = use_case(gateway, router(), config()).execute(&question()).await.unwrap();

        assert!(record.is_direct_answer());
        assert_eq!(record.gp_summary(), DIRECT_ANSWER_SUMMARY);
        assert!(record.integrated_response().contains("Ferritin"));
    }

    #[tokio::test]
    async fn test_gp_iteration_limit_yields_incomplete_record() {
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![
                    Scripted::Calls(vec![consult("cardiology", "a")]),
                    Scripted::Error(GatewayError::Unavailable("503".to_string())),
                ],
            )
            .script(CARDIOLOGY, vec![cited()]);

        let record = use_case(gateway, router(), config().with_max_gp_iterations(1))
            .execute(&question())
            .await
            .unwrap();

        assert_eq!(record.consultations().len(), 1);
        assert!(record.is_incomplete());
        assert!(record
            .warnings()
            .contains(&RecordWarning::GpIterationLimit { limit: 1 }));
        assert!(record.integrated_response().contains("Cardiology (C-001)"));
    }

    #[tokio::test]
    async fn test_closing_integration_after_last_dispatch() {
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![
                    Scripted::Calls(vec![consult("cardiology", "a")]),
                    Scripted::Calls(vec![complete("Cardiology consulted", "Start a DOAC")]),
                ],
            )
            .script(CARDIOLOGY, vec![cited()]);

        let record = use_case(gateway, router(), config().with_max_gp_iterations(1))
            .execute(&question())
            .await
            .unwrap();

        assert_eq!(record.integrated_response(), "Start a DOAC");
        assert!(record.gp_summary().starts_with("Cardiology consulted"));
        assert!(record.is_incomplete());
        assert!(record
            .warnings()
            .contains(&RecordWarning::GpIterationLimit { limit: 1 }));
    }

    #[tokio::test]
    async fn test_multi_batch_ledger_follows_issuance_order() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .script(
                    GP,
                    vec![
                        Scripted::Calls(vec![consult("cardiology", "a"), consult("neurology", "b")]),
                        Scripted::Calls(vec![consult("pharmacology", "Interactions with apixaban?")]),
                        Scripted::Calls(vec![complete("Three specialists consulted", "Integrated")]),
                    ],
                )
                .script(CARDIOLOGY, vec![cited()])
                .script(NEUROLOGY, vec![cited()])
                .script(PHARMACOLOGY, vec![cited()]),
        );
        let use_case =
            RunConsultationUseCase::new(Arc::clone(&gateway), Arc::new(router()), config());

        let record = use_case.execute(&question()).await.unwrap();

        let ledger: Vec<_> = record
            .consultations()
            .iter()
            .map(|p| {
                (
                    p.consultation().consultation_id().to_string(),
                    p.consultation().specialty(),
                    p.counter_referral().is_failure(),
                )
            })
            .collect();
        assert_eq!(
            ledger,
            vec![
                ("C-001".to_string(), Specialty::Cardiology, false),
                ("C-002".to_string(), Specialty::Neurology, false),
                ("C-003".to_string(), Specialty::Pharmacology, false),
            ]
        );
        assert!(!record.is_incomplete());
        assert!(record.warnings().is_empty());

        // the second batch starts only after the first has resolved
        let requests = gateway.requests.lock().unwrap();
        let position = |key: &str| {
            requests
                .iter()
                .position(|r| r.system_prompt.contains(key))
                .unwrap()
        };
        assert!(position(PHARMACOLOGY) > position(CARDIOLOGY));
        assert!(position(PHARMACOLOGY) > position(NEUROLOGY));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancellation_mid_dispatch() {
        let gateway = ScriptedGateway::new()
            .script(
                GP,
                vec![Scripted::Calls(vec![
                    consult("cardiology", "a"),
                    consult("neurology", "b"),
                ])],
            )
            .script(
                CARDIOLOGY,
                vec![Scripted::Delayed(Duration::from_secs(5), Box::new(cited()))],
            )
            .script(NEUROLOGY, vec![cited()]);
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        });

        let record = use_case(gateway, router(), config())
            .with_cancellation(token)
            .execute(&question())
            .await
            .unwrap();

        assert!(record.is_incomplete());
        assert!(record.warnings().contains(&RecordWarning::RunCancelled));
        let pairs = record.consultations();
        assert_eq!(pairs.len(), 2);
        assert_eq!(
            pairs[0].counter_referral().failure().map(|f| f.kind),
            Some(FailureKind::Cancelled)
        );
        assert!(!pairs[1].counter_referral().is_failure());
    }

    #[tokio::test]
    async fn test_run_timeout_cancels_run() {
        let gateway = ScriptedGateway::new()
            .script(GP, vec![Scripted::Calls(vec![consult("cardiology", "a")])])
            .script(
                CARDIOLOGY,
                vec![Scripted::Delayed(Duration::from_secs(5), Box::new(cited()))],
            );
        let config = config().with_run_timeout(Some(Duration::from_millis(100)));

        let record = use_case(gateway, router(), config).execute(&question()).await.unwrap();

        assert!(record.is_incomplete());
        assert!(record.warnings().contains(&RecordWarning::RunCancelled));
    }

    #[tokio::test]
    async fn test_cancelled_before_intake_is_fatal() {
        let token = CancellationToken::new();
        token.cancel();

        let result = use_case(ScriptedGateway::new(), router(), config())
            .with_cancellation(token)
            .execute(&question())
            .await;

        assert!(matches!(result, Err(RunConsultationError::Cancelled)));
    }

    #[tokio::test]
    async fn test_intake_unavailable_is_fatal() {
        let gateway = ScriptedGateway::new().script(
            GP,
            vec![Scripted::Error(GatewayError::Unavailable("503".to_string()))],
        );

        let result = use_case(gateway, router(), config()).execute(&question()).await;

        assert!(matches!(result, Err(RunConsultationError::Gateway(_))));
    }

    #[tokio::test]
    async fn test_configuration_errors_are_fatal() {
        let result = use_case(
            ScriptedGateway::new(),
            router(),
            config().with_specialties([]).with_consultation_mandatory(true),
        )
        .execute(&question())
        .await;
        assert!(matches!(result, Err(RunConsultationError::NoSpecialtiesConfigured)));

        let result = use_case(ScriptedGateway::new(), router(), config().with_max_gp_iterations(0))
            .execute(&question())
            .await;
        let Err(RunConsultationError::InvalidConfig(issues)) = result else {
            panic!("expected invalid configuration");
        };
        assert!(issues.iter().any(|i| i.code == ConfigIssueCode::ZeroBudget));
    }

    #[tokio::test]
    async fn test_identical_runs_have_identical_structure() {
        async fn run_once() -> Vec<(String, Specialty)> {
            let gateway = ScriptedGateway::new()
                .script(
                    GP,
                    vec![
                        Scripted::Calls(vec![consult("neurology", "a"), consult("cardiology", "b")]),
                        Scripted::Calls(vec![complete("done", "done")]),
                    ],
                )
                .script(CARDIOLOGY, vec![cited()])
                .script(NEUROLOGY, vec![cited()]);
            let record = use_case(gateway, router(), config()).execute(&question()).await.unwrap();
            record
                .consultations()
                .iter()
                .map(|p| {
                    (
                        p.consultation().consultation_id().to_string(),
                        p.consultation().specialty(),
                    )
                })
                .collect()
        }

        let first = run_once().await;
        assert_eq!(
            first,
            vec![
                ("C-001".to_string(), Specialty::Neurology),
                ("C-002".to_string(), Specialty::Cardiology),
            ]
        );
        assert_eq!(first, run_once().await);
    }
}
