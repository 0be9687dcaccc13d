//! Infrastructure layer for interconsult
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file loading, the specialty
//! knowledge base, literature search, generation gateways, research tool
//! capabilities and the JSONL run transcript.

pub mod config;
pub mod generation;
pub mod knowledge;
pub mod literature;
pub mod logging;
pub mod tools;

// Re-export commonly used types
pub use config::{
    ConfigLoadError, ConfigLoader, FileConfig, FileEngineConfig, FileKnowledgeConfig,
    FileLiteratureConfig, FileLoggingConfig, FileModelsConfig, FileOutputConfig,
    FileProviderConfig,
};
#[cfg(feature = "openai")]
pub use generation::{OpenAiGateway, OpenAiSettings};
pub use knowledge::{InMemoryKnowledgeBase, KnowledgeLoadError};
#[cfg(feature = "pubmed")]
pub use literature::PubMedClient;
pub use logging::JsonlRunEventLogger;
pub use tools::{ResearchSources, build_router};
