//! rag_query: specialty knowledge base passages

use async_trait::async_trait;
use interconsult_application::{KnowledgeRetriever, ToolCapability};
use interconsult_domain::clinical::catalog;
use interconsult_domain::{Specialty, ToolCall, ToolDefinition, ToolError};
use std::sync::Arc;

/// Upper bound on passages per query regardless of what the model asks for
const MAX_TOP_K: usize = 10;

pub struct RagCapability {
    retriever: Arc<dyn KnowledgeRetriever>,
    default_top_k: usize,
}

impl RagCapability {
    pub fn new(retriever: Arc<dyn KnowledgeRetriever>, default_top_k: usize) -> Self {
        Self {
            retriever,
            default_top_k: default_top_k.clamp(1, MAX_TOP_K),
        }
    }
}

#[async_trait]
impl ToolCapability for RagCapability {
    fn definition(&self) -> ToolDefinition {
        catalog::rag_query()
    }

    async fn invoke(&self, call: &ToolCall, specialty: Specialty) -> Result<String, ToolError> {
        let query = call.require_string("query").map_err(ToolError::invalid_argument)?;
        let target = match call.get_string("specialty") {
            Some(name) if !name.trim().is_empty() => name
                .parse::<Specialty>()
                .map_err(|e| ToolError::invalid_argument(e.to_string()))?,
            _ => specialty,
        };
        let top_k = call
            .get_i64("top_k")
            .map(|k| (k.max(1) as usize).min(MAX_TOP_K))
            .unwrap_or(self.default_top_k);

        let passages = self
            .retriever
            .retrieve(target, query, top_k)
            .await
            .map_err(|e| ToolError::execution_failed(e.to_string()))?;

        if passages.is_empty() {
            return Ok(format!(
                "No relevant documents found in the {} knowledge base for: {}",
                target.display_name(),
                query
            ));
        }

        let mut output = format!(
            "Found {} relevant document(s) in the {} knowledge base:\n",
            passages.len(),
            target.display_name()
        );
        for (i, passage) in passages.iter().enumerate() {
            output.push_str(&format!(
                "\n[Document {}]\nSource: {} (relevance {:.2})\n{}\n",
                i + 1,
                passage.source,
                passage.score,
                passage.content
            ));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeBase;

    fn capability() -> RagCapability {
        let kb = InMemoryKnowledgeBase::new()
            .with_document(
                Specialty::Cardiology,
                "esc_af_2020.md",
                "Oral anticoagulation is recommended for CHA2DS2-VASc score of 2 or more in men.",
            )
            .with_document(
                Specialty::Nutrition,
                "mediterranean.md",
                "Mediterranean diet lowers cardiovascular events.",
            );
        RagCapability::new(Arc::new(kb), 3)
    }

    #[tokio::test]
    async fn test_formats_documents() {
        let call = ToolCall::new("rag_query").with_arg("query", "anticoagulation score");
        let output = capability().invoke(&call, Specialty::Cardiology).await.unwrap();
        assert!(output.contains("[Document 1]"));
        assert!(output.contains("Source: esc_af_2020.md"));
    }

    #[tokio::test]
    async fn test_empty_result_is_valid_answer() {
        let call = ToolCall::new("rag_query").with_arg("query", "anticoagulation");
        let output = capability().invoke(&call, Specialty::Neurology).await.unwrap();
        assert!(output.starts_with("No relevant documents found"));
    }

    #[tokio::test]
    async fn test_specialty_override() {
        let call = ToolCall::new("rag_query")
            .with_arg("query", "mediterranean diet")
            .with_arg("specialty", "nutrition");
        let output = capability().invoke(&call, Specialty::Cardiology).await.unwrap();
        assert!(output.contains("mediterranean.md"));

        let bad = call.with_arg("specialty", "astrology");
        let err = capability().invoke(&bad, Specialty::Cardiology).await.unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }
}
