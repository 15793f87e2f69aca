//! The structured company profile returned by the pipeline.

use serde::{Deserialize, Serialize};

/// Where a profile ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileSource {
    /// AI-search provider
    Primary,
    /// Keyword web search (LLM or heuristic extraction)
    Secondary,
    /// Served from the durable cache
    Cache,
    /// Terminal fallback: no provider yielded usable data
    Fallback,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Primary => "primary",
            ProfileSource::Secondary => "secondary",
            ProfileSource::Cache => "cache",
            ProfileSource::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProfileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated social profile links.
///
/// Each link has already been checked against the strict per-platform
/// URL pattern; anything that did not match was dropped with a warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none() && self.twitter.is_none() && self.github.is_none()
    }
}

/// A normalized, validated and scored company profile.
///
/// All string fields are truncated to their documented limits. Provenance
/// fields (`confidence`, `source`, `ai_generated`, `citation_urls`) describe
/// where the data came from and how much to trust it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub founded_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_size: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_people: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_summary: Option<String>,
    #[serde(default)]
    pub social_links: SocialLinks,

    // Provenance
    pub confidence: f64,
    pub source: ProfileSource,
    pub ai_generated: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub citation_urls: Vec<String>,
}

impl EnrichedProfile {
    /// An empty profile shell with the given provenance.
    pub fn empty(source: ProfileSource, ai_generated: bool) -> Self {
        Self {
            description: None,
            industry: None,
            location: None,
            founded_year: None,
            company_size: None,
            key_people: Vec::new(),
            product_summary: None,
            social_links: SocialLinks::default(),
            confidence: 0.0,
            source,
            ai_generated,
            citation_urls: Vec::new(),
        }
    }
}
