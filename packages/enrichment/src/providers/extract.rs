//! Structured extraction of free text into the fixed profile shape.
//!
//! Every parse is fallible: code fences are stripped before parsing and a
//! parse failure returns `Ok(None)` so the chain falls through to the next
//! provider instead of propagating an error.

use crate::breaker::BreakerRegistry;
use crate::retry::{resilient_call, CallFailure, RetryPolicy};
use crate::types::CompanyIdentity;

use super::{strip_code_fences, truncate_chars, CompletionClient, RawProfile};

/// Free text fed into one extraction call.
const MAX_SOURCE_CHARS: usize = 12_000;

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract company facts from research notes.

Output ONLY a JSON object with this exact shape (omit unknown fields):
{
  "description": "what the company does, 1-3 sentences",
  "industry": "primary industry",
  "location": "headquarters city and country",
  "foundedYear": "YYYY",
  "companySize": "headcount or band, e.g. '200-500 employees'",
  "keyPeople": ["Full Name (Title)"],
  "productSummary": "main products or services, 1-3 sentences",
  "linkedin": "https://linkedin.com/company/...",
  "twitter": "https://x.com/...",
  "github": "https://github.com/..."
}

Only state facts present in the notes. No markdown, no commentary."#;

/// Second-stage extraction call, usually against a cheaper model than the
/// research call.
#[derive(Clone)]
pub struct StructuredExtractor {
    client: CompletionClient,
}

impl StructuredExtractor {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }

    /// Extract a [`RawProfile`] from free text.
    ///
    /// Breaker bookkeeping is charged to the calling provider's name so an
    /// extraction outage trips the same breaker as the research call.
    /// Returns `Ok(None)` when the model output is not parseable JSON.
    pub async fn extract(
        &self,
        breakers: &BreakerRegistry,
        provider: &str,
        policy: &RetryPolicy,
        identity: &CompanyIdentity,
        text: &str,
    ) -> Result<Option<RawProfile>, CallFailure> {
        let user = format!(
            "Company: {} ({})\n\nResearch notes:\n{}",
            identity.display_name,
            identity.domain,
            truncate_chars(text, MAX_SOURCE_CHARS)
        );

        let outcome = resilient_call(breakers, provider, policy, || {
            self.client.chat(EXTRACTION_SYSTEM_PROMPT, &user)
        })
        .await?;

        Ok(parse_raw_profile(&outcome.content))
    }
}

/// Parse model output into a [`RawProfile`], tolerating fence wrapping.
pub fn parse_raw_profile(content: &str) -> Option<RawProfile> {
    serde_json::from_str(content)
        .or_else(|_| serde_json::from_str(strip_code_fences(content)))
        .map_err(|e| {
            tracing::debug!(error = %e, "extraction output was not valid JSON");
            e
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let raw = parse_raw_profile(r#"{"description":"Acme makes rockets."}"#).unwrap();
        assert_eq!(raw.description.as_deref(), Some("Acme makes rockets."));
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = "```json\n{\"industry\": \"Aerospace\"}\n```";
        let raw = parse_raw_profile(fenced).unwrap();
        assert_eq!(raw.industry.as_deref(), Some("Aerospace"));
    }

    #[test]
    fn unparseable_output_is_none_not_error() {
        assert!(parse_raw_profile("I could not find anything.").is_none());
        assert!(parse_raw_profile("").is_none());
    }
}
