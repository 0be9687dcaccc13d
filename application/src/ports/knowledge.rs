//! Knowledge retrieval port

use async_trait::async_trait;
use interconsult_domain::Specialty;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A passage returned by the specialty knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Document the passage came from
    pub source: String,
    pub content: String,
    /// Relevance score, higher is better
    pub score: f32,
}

#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge base unavailable: {0}")]
    Unavailable(String),
}

/// Retrieval over a specialty's knowledge base
///
/// An empty result is a valid answer, not an error. Implementations must be
/// safe for concurrent reads: every specialist of a run shares one instance.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    async fn retrieve(
        &self,
        specialty: Specialty,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<Passage>, KnowledgeError>;
}
