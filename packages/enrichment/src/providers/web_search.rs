//! Keyword web-search provider (secondary).
//!
//! Issues a Tavily-style search for the company, feeds the top snippets to
//! the structured-extraction step, and falls back to the local heuristic
//! extractor if extraction fails. The heuristic path makes no AI call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{extract_from_snippets, EnrichmentProvider, RawProfile, StructuredExtractor};
use crate::breaker::BreakerRegistry;
use crate::error::ProviderError;
use crate::retry::{resilient_call, CallError, RetryPolicy};
use crate::types::{CompanyIdentity, ProfileSource};

/// Snippets fed into extraction per request.
const MAX_SNIPPETS: usize = 8;
/// Citation URLs kept on the resulting profile.
const MAX_CITATIONS: usize = 5;

/// Web-search API client.
#[derive(Clone)]
pub struct SearchClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

/// Individual search result snippet.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Serialize)]
struct SearchRequest {
    api_key: String,
    query: String,
    search_depth: &'static str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchSnippet>,
}

impl SearchClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// One keyword search. The caller wraps this in `resilient_call`.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<SearchSnippet>, CallError> {
        let request = SearchRequest {
            api_key: self.api_key.clone(),
            query: query.to_string(),
            search_depth: "basic",
            max_results,
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(CallError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CallError::from_status(
                status.as_u16(),
                super::truncate_chars(&body, 300).to_string(),
            ));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(format!("malformed search response: {}", e)))?;

        Ok(parsed.results)
    }
}

/// Secondary provider: keyword search + extraction, heuristic fallback.
pub struct WebSearchProvider {
    search: SearchClient,
    extractor: Option<StructuredExtractor>,
    breakers: Arc<BreakerRegistry>,
    policy: RetryPolicy,
}

impl WebSearchProvider {
    pub fn new(
        search: SearchClient,
        extractor: Option<StructuredExtractor>,
        breakers: Arc<BreakerRegistry>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            search,
            extractor,
            breakers,
            policy,
        }
    }
}

#[async_trait]
impl EnrichmentProvider for WebSearchProvider {
    fn name(&self) -> &str {
        "web-search"
    }

    fn source(&self) -> ProfileSource {
        ProfileSource::Secondary
    }

    async fn try_enrich(
        &self,
        identity: &CompanyIdentity,
    ) -> Result<Option<RawProfile>, ProviderError> {
        let query = format!(
            "\"{}\" {} company about industry headquarters founded employees",
            identity.display_name, identity.domain
        );

        let snippets = resilient_call(&self.breakers, self.name(), &self.policy, || {
            self.search.search(&query, MAX_SNIPPETS)
        })
        .await
        .map_err(|f| f.into_provider_error(self.name()))?;

        if snippets.is_empty() {
            tracing::debug!(provider = self.name(), "search returned no results");
            return Ok(None);
        }

        let citation_urls: Vec<String> = snippets
            .iter()
            .map(|s| s.url.clone())
            .take(MAX_CITATIONS)
            .collect();

        if let Some(extractor) = &self.extractor {
            let corpus = snippets
                .iter()
                .map(|s| format!("{} ({})\n{}", s.title, s.url, s.content))
                .collect::<Vec<_>>()
                .join("\n\n");

            match extractor
                .extract(&self.breakers, self.name(), &self.policy, identity, &corpus)
                .await
            {
                Ok(Some(mut raw)) => {
                    raw.citation_urls = citation_urls;
                    return Ok(Some(raw));
                }
                Ok(None) => {
                    tracing::debug!(
                        provider = self.name(),
                        "structured extraction unusable, trying heuristic extractor"
                    );
                }
                Err(failure) => {
                    tracing::warn!(
                        provider = self.name(),
                        error = ?failure.error,
                        "extraction call failed, trying heuristic extractor"
                    );
                }
            }
        }

        Ok(extract_from_snippets(identity, &snippets).map(|mut raw| {
            raw.citation_urls = citation_urls;
            raw
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_tolerates_missing_fields() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"results":[{"url":"https://acme.io","content":"Acme makes rockets."}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "");
        assert_eq!(parsed.results[0].score, 0.0);
    }
}
