//! Literature search port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A bibliographic reference returned by a literature search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub pmid: String,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(default)]
    pub journal: String,
    #[serde(default)]
    pub year: Option<i32>,
    pub url: String,
}

impl Citation {
    /// Short reference suitable for `evidence_used`
    pub fn reference(&self) -> String {
        let authors = match self.authors.as_slice() {
            [] => String::new(),
            [one] => format!("{}. ", one),
            [first, ..] => format!("{} et al. ", first),
        };
        let year = self.year.map(|y| format!(" {}", y)).unwrap_or_default();
        format!(
            "{}{}. {}{}. PMID: {}",
            authors, self.title, self.journal, year, self.pmid
        )
    }
}

/// Filters applied to a literature search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteratureFilters {
    /// Only publications from the last N years
    pub years_back: Option<u32>,
    pub max_results: usize,
}

impl Default for LiteratureFilters {
    fn default() -> Self {
        Self {
            years_back: Some(5),
            max_results: 5,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LiteratureError {
    #[error("Literature search rate limited: {0}")]
    RateLimited(String),

    #[error("Literature search unavailable: {0}")]
    Unavailable(String),
}

impl LiteratureError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LiteratureError::RateLimited(_))
    }
}

/// Search over the medical literature
///
/// No results is an empty list. Rate limiting is reported so the caller can
/// retry with backoff.
#[async_trait]
pub trait LiteratureSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        filters: &LiteratureFilters,
    ) -> Result<Vec<Citation>, LiteratureError>;
}
