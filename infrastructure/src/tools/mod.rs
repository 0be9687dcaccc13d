//! Research tool capabilities
//!
//! Calculators and diagnostic criteria are always bound. Knowledge retrieval
//! and literature search are bound only when a source is configured, so a
//! specialist is never offered a tool that cannot answer.

mod calculator;
mod criteria;
mod literature;
mod rag;

pub use calculator::CalculatorCapability;
pub use criteria::CriteriaCapability;
pub use literature::LiteratureCapability;
pub use rag::RagCapability;

use interconsult_application::{
    KnowledgeRetriever, LiteratureFilters, LiteratureSearch, RetryPolicy, ToolRouter,
};
use std::sync::Arc;
use std::time::Duration;

/// External sources behind the research tools
pub struct ResearchSources {
    pub knowledge: Option<Arc<dyn KnowledgeRetriever>>,
    pub top_k: usize,
    pub literature: Option<Arc<dyn LiteratureSearch>>,
    pub literature_defaults: LiteratureFilters,
    pub literature_retry: RetryPolicy,
}

impl Default for ResearchSources {
    fn default() -> Self {
        Self {
            knowledge: None,
            top_k: 3,
            literature: None,
            literature_defaults: LiteratureFilters::default(),
            literature_retry: RetryPolicy::default(),
        }
    }
}

/// Router with every capability the sources allow
pub fn build_router(tool_timeout: Duration, sources: ResearchSources) -> ToolRouter {
    let mut router = CalculatorCapability::all()
        .into_iter()
        .fold(ToolRouter::new(tool_timeout), |router, capability| {
            router.with_capability(Arc::new(capability))
        })
        .with_capability(Arc::new(CriteriaCapability));

    if let Some(retriever) = sources.knowledge {
        router = router.with_capability(Arc::new(RagCapability::new(retriever, sources.top_k)));
    }
    if let Some(search) = sources.literature {
        router = router.with_capability(Arc::new(LiteratureCapability::new(
            search,
            sources.literature_defaults,
            sources.literature_retry,
        )));
    }
    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::InMemoryKnowledgeBase;
    use interconsult_domain::Specialty;
    use interconsult_domain::clinical::catalog;

    #[test]
    fn test_offline_router_has_no_rag_or_literature() {
        let router = build_router(Duration::from_secs(5), ResearchSources::default());
        assert!(router.has_capability(catalog::CALCULATE_GFR));
        assert!(router.has_capability(catalog::LOOKUP_DIAGNOSTIC_CRITERIA));
        assert!(!router.has_capability(catalog::RAG_QUERY));
        assert!(!router.has_capability(catalog::LITERATURE_SEARCH));
    }

    #[test]
    fn test_specialty_spec_follows_bound_tools() {
        let sources = ResearchSources {
            knowledge: Some(Arc::new(InMemoryKnowledgeBase::new())),
            ..Default::default()
        };
        let router = build_router(Duration::from_secs(5), sources);

        let spec = router.spec_for(Specialty::Cardiology);
        assert!(spec.contains(catalog::RAG_QUERY));
        assert!(spec.contains(catalog::CALCULATE_CHADS2VASC));
        assert!(!spec.contains(catalog::CALCULATE_WELLS_DVT));
        assert!(!spec.contains(catalog::LITERATURE_SEARCH));
    }
}
