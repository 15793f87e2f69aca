//! Provider adapters for the enrichment fallback chain.
//!
//! Each adapter implements one interface and the orchestrator iterates an
//! explicit ordered list until one succeeds, so it stays free of
//! provider-specific branching.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::ProviderError;
use crate::types::CompanyIdentity;

mod ai_search;
mod chat;
mod extract;
mod heuristic;
mod web_search;

pub use ai_search::AiSearchProvider;
pub use chat::{CompletionClient, CompletionOutcome};
pub use extract::StructuredExtractor;
pub use heuristic::extract_from_snippets;
pub use web_search::{SearchClient, SearchSnippet, WebSearchProvider};

/// One strategy in the fallback chain.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    /// Stable name used for circuit-breaker keying and logs.
    fn name(&self) -> &str;

    /// Provenance tag stamped on profiles this provider produces.
    fn source(&self) -> crate::types::ProfileSource;

    /// Attempt to enrich. `Ok(None)` means "nothing usable found, try the
    /// next provider"; `Err` means the provider itself failed.
    async fn try_enrich(
        &self,
        identity: &CompanyIdentity,
    ) -> Result<Option<RawProfile>, ProviderError>;
}

/// Unvalidated provider output, before schema validation and scoring.
///
/// Deliberately lenient: LLMs return years as numbers or strings and key
/// people as strings or objects, so deserialization smooths those over
/// instead of failing the whole parse.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawProfile {
    pub description: Option<String>,
    pub industry: Option<String>,
    pub location: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub founded_year: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub company_size: Option<String>,
    pub key_people: Vec<serde_json::Value>,
    pub product_summary: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub github: Option<String>,
    /// Filled by the adapter, not the LLM
    #[serde(skip)]
    pub citation_urls: Vec<String>,
    /// False only for the heuristic extractor
    #[serde(skip, default = "default_true")]
    pub ai_generated: bool,
}

impl Default for RawProfile {
    fn default() -> Self {
        Self {
            description: None,
            industry: None,
            location: None,
            founded_year: None,
            company_size: None,
            key_people: Vec::new(),
            product_summary: None,
            linkedin: None,
            twitter: None,
            github: None,
            citation_urls: Vec::new(),
            ai_generated: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }))
}

/// Strip markdown code-fence wrapping from an LLM response before parsing.
pub fn strip_code_fences(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Truncate to a character budget without splitting a UTF-8 boundary.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
