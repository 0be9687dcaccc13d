//! literature_search: literature lookup with rate-limit backoff

use async_trait::async_trait;
use interconsult_application::{
    LiteratureError, LiteratureFilters, LiteratureSearch, RetryPolicy, ToolCapability,
};
use interconsult_domain::clinical::catalog;
use interconsult_domain::{Specialty, ToolCall, ToolDefinition, ToolError};
use std::sync::Arc;
use tracing::warn;

const MAX_RESULTS: usize = 20;

pub struct LiteratureCapability {
    search: Arc<dyn LiteratureSearch>,
    defaults: LiteratureFilters,
    retry: RetryPolicy,
}

impl LiteratureCapability {
    pub fn new(search: Arc<dyn LiteratureSearch>, defaults: LiteratureFilters, retry: RetryPolicy) -> Self {
        Self {
            search,
            defaults,
            retry,
        }
    }

    fn filters(&self, call: &ToolCall) -> LiteratureFilters {
        LiteratureFilters {
            years_back: call
                .get_i64("years_back")
                .map(|y| y.clamp(1, 100) as u32)
                .or(self.defaults.years_back),
            max_results: call
                .get_i64("max_results")
                .map(|n| (n.max(1) as usize).min(MAX_RESULTS))
                .unwrap_or(self.defaults.max_results),
        }
    }
}

#[async_trait]
impl ToolCapability for LiteratureCapability {
    fn definition(&self) -> ToolDefinition {
        catalog::literature_search()
    }

    async fn invoke(&self, call: &ToolCall, specialty: Specialty) -> Result<String, ToolError> {
        let query = call.require_string("query").map_err(ToolError::invalid_argument)?;
        let filters = self.filters(call);

        let mut attempt = 1;
        let citations = loop {
            match self.search.search(query, &filters).await {
                Ok(citations) => break citations,
                Err(LiteratureError::RateLimited(message)) if attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    warn!(
                        specialty = %specialty,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Literature search rate limited: {}",
                        message
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(LiteratureError::RateLimited(message)) => {
                    return Err(ToolError::rate_limited(message));
                }
                Err(e) => return Err(ToolError::execution_failed(e.to_string())),
            }
        };

        if citations.is_empty() {
            return Ok(format!("No articles found for: {}", query));
        }

        let mut output = format!("Found {} article(s) for: {}\n", citations.len(), query);
        for (i, citation) in citations.iter().enumerate() {
            output.push_str(&format!(
                "\n{}. {}\n   PMID: {} | {}\n",
                i + 1,
                citation.reference(),
                citation.pmid,
                citation.url
            ));
        }
        output.push_str("\nCite articles in evidence_used as \"PMID: <id>\".");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interconsult_application::Citation;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Fails with `RateLimited` for the first `throttled` calls
    struct ThrottledSearch {
        throttled: usize,
        calls: Mutex<Vec<LiteratureFilters>>,
    }

    impl ThrottledSearch {
        fn new(throttled: usize) -> Self {
            Self {
                throttled,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LiteratureSearch for ThrottledSearch {
        async fn search(
            &self,
            _query: &str,
            filters: &LiteratureFilters,
        ) -> Result<Vec<Citation>, LiteratureError> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(filters.clone());
            if calls.len() <= self.throttled {
                return Err(LiteratureError::RateLimited("429".to_string()));
            }
            Ok(vec![Citation {
                pmid: "32860505".to_string(),
                title: "2020 ESC Guidelines for atrial fibrillation".to_string(),
                authors: vec!["Hindricks G".to_string()],
                journal: "Eur Heart J".to_string(),
                year: Some(2021),
                url: "https://pubmed.ncbi.nlm.nih.gov/32860505/".to_string(),
            }])
        }
    }

    fn retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2,
        }
    }

    fn call() -> ToolCall {
        ToolCall::new("literature_search").with_arg("query", "apixaban elderly")
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_formats() {
        let search = Arc::new(ThrottledSearch::new(2));
        let capability = LiteratureCapability::new(search.clone(), LiteratureFilters::default(), retry(3));

        let output = capability.invoke(&call(), Specialty::Cardiology).await.unwrap();
        assert_eq!(search.calls.lock().unwrap().len(), 3);
        assert!(output.contains("PMID: 32860505"));
        assert!(output.contains("https://pubmed.ncbi.nlm.nih.gov/32860505/"));
    }

    #[tokio::test]
    async fn test_rate_limit_after_retries_is_typed_failure() {
        let capability =
            LiteratureCapability::new(Arc::new(ThrottledSearch::new(5)), LiteratureFilters::default(), retry(2));
        let err = capability.invoke(&call(), Specialty::Cardiology).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_call_arguments_override_filters() {
        let search = Arc::new(ThrottledSearch::new(0));
        let capability = LiteratureCapability::new(search.clone(), LiteratureFilters::default(), retry(1));
        let call = call().with_arg("max_results", 50).with_arg("years_back", 2);

        capability.invoke(&call, Specialty::Pharmacology).await.unwrap();
        let filters = search.calls.lock().unwrap()[0].clone();
        assert_eq!(filters.max_results, MAX_RESULTS);
        assert_eq!(filters.years_back, Some(2));
    }
}
