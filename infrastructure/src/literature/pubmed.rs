//! PubMed literature search over NCBI E-utilities (esearch + esummary)

use super::eutils::{date_window, parse_esearch, parse_esummary, search_term};
use async_trait::async_trait;
use interconsult_application::{Citation, LiteratureError, LiteratureFilters, LiteratureSearch};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

const TOOL_NAME: &str = "interconsult";

pub struct PubMedClient {
    client: reqwest::Client,
    base_url: String,
    email: Option<String>,
    api_key: Option<String>,
}

impl PubMedClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LiteratureError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("interconsult/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LiteratureError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: None,
            api_key: None,
        })
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    async fn get(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<serde_json::Value, LiteratureError> {
        let mut query: Vec<(&str, String)> = vec![
            ("db", "pubmed".to_string()),
            ("retmode", "json".to_string()),
            ("tool", TOOL_NAME.to_string()),
        ];
        query.extend(params.iter().cloned());
        if let Some(email) = &self.email {
            query.push(("email", email.clone()));
        }
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }

        let response = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&query)
            .send()
            .await
            .map_err(|e| LiteratureError::Unavailable(format!("request failed: {}", e)))?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(LiteratureError::RateLimited(
                "NCBI E-utilities returned 429".to_string(),
            )),
            status if !status.is_success() => Err(LiteratureError::Unavailable(format!(
                "NCBI E-utilities returned {}",
                status
            ))),
            _ => response
                .json()
                .await
                .map_err(|e| LiteratureError::Unavailable(format!("invalid response: {}", e))),
        }
    }
}

#[async_trait]
impl LiteratureSearch for PubMedClient {
    async fn search(
        &self,
        query: &str,
        filters: &LiteratureFilters,
    ) -> Result<Vec<Citation>, LiteratureError> {
        let mut params = vec![
            ("term", search_term(query)),
            ("retmax", filters.max_results.to_string()),
            ("sort", "relevance".to_string()),
        ];
        if let Some(years) = filters.years_back {
            let (min, max) = date_window(years);
            params.push(("datetype", "pdat".to_string()));
            params.push(("mindate", min));
            params.push(("maxdate", max));
        }

        let ids = parse_esearch(&self.get("esearch.fcgi", &params).await?);
        debug!(query, hits = ids.len(), "PubMed esearch");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let summary = self
            .get("esummary.fcgi", &[("id", ids.join(","))])
            .await?;
        Ok(parse_esummary(&summary))
    }
}
