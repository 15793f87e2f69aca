//! AI-search provider (primary).
//!
//! Asks a search-grounded completion endpoint a natural-language research
//! question about the company, then runs the answer through the structured
//! extraction step. Citation URLs returned by the endpoint are merged onto
//! the profile.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CompletionClient, EnrichmentProvider, RawProfile, StructuredExtractor};
use crate::breaker::BreakerRegistry;
use crate::error::ProviderError;
use crate::retry::{resilient_call, RetryPolicy};
use crate::types::{CompanyIdentity, ProfileSource};

const RESEARCH_SYSTEM_PROMPT: &str =
    "You are a company research assistant. Answer factually and cite sources.";

pub struct AiSearchProvider {
    research: CompletionClient,
    extractor: StructuredExtractor,
    breakers: Arc<BreakerRegistry>,
    policy: RetryPolicy,
}

impl AiSearchProvider {
    pub fn new(
        research: CompletionClient,
        extractor: StructuredExtractor,
        breakers: Arc<BreakerRegistry>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            research,
            extractor,
            breakers,
            policy,
        }
    }
}

#[async_trait]
impl EnrichmentProvider for AiSearchProvider {
    fn name(&self) -> &str {
        "ai-search"
    }

    fn source(&self) -> ProfileSource {
        ProfileSource::Primary
    }

    async fn try_enrich(
        &self,
        identity: &CompanyIdentity,
    ) -> Result<Option<RawProfile>, ProviderError> {
        let question = format!(
            "Research the company operating the website {domain} (likely called \"{name}\"). \
             What does it do, what industry is it in, where is it headquartered, when was it \
             founded, roughly how many people work there, who are its key executives, what are \
             its main products, and what are its official LinkedIn/Twitter/GitHub profiles?",
            domain = identity.domain,
            name = identity.display_name,
        );

        let answer = resilient_call(&self.breakers, self.name(), &self.policy, || {
            self.research.chat(RESEARCH_SYSTEM_PROMPT, &question)
        })
        .await
        .map_err(|f| f.into_provider_error(self.name()))?;

        if answer.content.trim().is_empty() {
            tracing::debug!(provider = self.name(), "research answer was empty");
            return Ok(None);
        }

        let raw = self
            .extractor
            .extract(
                &self.breakers,
                self.name(),
                &self.policy,
                identity,
                &answer.content,
            )
            .await
            .map_err(|f| f.into_provider_error(self.name()))?;

        Ok(raw.map(|mut profile| {
            for url in answer.citations {
                if !profile.citation_urls.contains(&url) {
                    profile.citation_urls.push(url);
                }
            }
            profile
        }))
    }
}
