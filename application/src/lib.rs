//! Application layer for interconsult
//!
//! This crate contains use cases, port definitions, and engine configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, RetryPolicy};
pub use ports::{
    generation::{GatewayError, GenerationGateway, GenerationRequest},
    knowledge::{KnowledgeError, KnowledgeRetriever, Passage},
    literature::{Citation, LiteratureError, LiteratureFilters, LiteratureSearch},
    progress::{ConsultationProgressNotifier, NoProgress},
    run_event_logger::{NoRunEventLogger, RunEvent, RunEventLogger},
    tool_capability::ToolCapability,
};
pub use use_cases::assemble_record::{ClinicalRecordAssembler, RecordDraft};
pub use use_cases::gp_controller::{GpController, GpDecision, GpError, GpSession};
pub use use_cases::run_consultation::{RunConsultationError, RunConsultationUseCase};
pub use use_cases::tool_router::ToolRouter;
