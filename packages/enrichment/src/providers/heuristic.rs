//! Local heuristic extractor.
//!
//! Pattern-matches search snippets directly when structured extraction is
//! unavailable or failed. No AI call, so the resulting profile is marked
//! `ai_generated = false`.

use lazy_static::lazy_static;
use regex::Regex;

use super::{RawProfile, SearchSnippet};
use crate::types::CompanyIdentity;

lazy_static! {
    static ref FOUNDED_RE: Regex =
        Regex::new(r"(?i)founded\s+in\s+((?:18|19|20)\d{2})").unwrap();
    static ref HEADQUARTERED_RE: Regex =
        Regex::new(r"(?i)headquarter(?:ed|s)\s+in\s+([A-Z][A-Za-z .,'\-]{2,80}?)[.;\n]").unwrap();
    static ref EMPLOYEES_RE: Regex =
        Regex::new(r"(?i)\b([0-9][0-9,]{0,9}\+?)\s+employees").unwrap();
    static ref LINKEDIN_RE: Regex =
        Regex::new(r"https?://(?:www\.)?linkedin\.com/company/[A-Za-z0-9\-_%.]+").unwrap();
    static ref TWITTER_RE: Regex =
        Regex::new(r"https?://(?:www\.)?(?:twitter|x)\.com/[A-Za-z0-9_]{1,15}\b").unwrap();
    static ref GITHUB_RE: Regex =
        Regex::new(r"https?://(?:www\.)?github\.com/[A-Za-z0-9][A-Za-z0-9\-]*\b").unwrap();
}

/// Industry keywords checked in order; first hit wins.
const INDUSTRY_KEYWORDS: &[&str] = &[
    "aerospace",
    "fintech",
    "biotech",
    "cybersecurity",
    "e-commerce",
    "healthcare",
    "software",
    "robotics",
    "logistics",
    "manufacturing",
    "telecommunications",
    "insurance",
    "real estate",
    "renewable energy",
    "education",
    "gaming",
    "advertising",
    "consulting",
    "retail",
    "media",
];

/// Regex-only extraction over search snippets.
///
/// Returns `None` unless at least one structured field matched; a bare
/// description copied out of a snippet is not worth caching.
pub fn extract_from_snippets(
    identity: &CompanyIdentity,
    snippets: &[SearchSnippet],
) -> Option<RawProfile> {
    let corpus = snippets
        .iter()
        .map(|s| format!("{}\n{}\n{}", s.title, s.content, s.url))
        .collect::<Vec<_>>()
        .join("\n");

    let mut raw = RawProfile {
        ai_generated: false,
        ..Default::default()
    };

    if let Some(caps) = FOUNDED_RE.captures(&corpus) {
        raw.founded_year = Some(caps[1].to_string());
    }
    if let Some(caps) = HEADQUARTERED_RE.captures(&corpus) {
        raw.location = Some(caps[1].trim().to_string());
    }
    if let Some(caps) = EMPLOYEES_RE.captures(&corpus) {
        raw.company_size = Some(format!("{} employees", &caps[1]));
    }

    let lowered = corpus.to_lowercase();
    if let Some(keyword) = INDUSTRY_KEYWORDS.iter().find(|k| lowered.contains(*k)) {
        let mut chars = keyword.chars();
        raw.industry = chars
            .next()
            .map(|c| c.to_uppercase().collect::<String>() + chars.as_str());
    }

    if let Some(m) = LINKEDIN_RE.find(&corpus) {
        raw.linkedin = Some(m.as_str().to_string());
    }
    if let Some(m) = TWITTER_RE.find(&corpus) {
        raw.twitter = Some(m.as_str().to_string());
    }
    if let Some(m) = GITHUB_RE.find(&corpus) {
        raw.github = Some(m.as_str().to_string());
    }

    // Use the best snippet that actually mentions the company as a
    // description, if any
    let name_lower = identity.display_name.to_lowercase();
    raw.description = snippets
        .iter()
        .filter(|s| {
            !s.content.trim().is_empty() && s.content.to_lowercase().contains(&name_lower)
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .map(|s| s.content.trim().to_string());

    let matched_something = raw.founded_year.is_some()
        || raw.location.is_some()
        || raw.company_size.is_some()
        || raw.industry.is_some()
        || raw.linkedin.is_some()
        || raw.twitter.is_some()
        || raw.github.is_some();

    if matched_something {
        Some(raw)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> CompanyIdentity {
        CompanyIdentity::new("acme.io", "Acme")
    }

    fn snippet(content: &str) -> SearchSnippet {
        SearchSnippet {
            title: "Acme | About".into(),
            url: "https://acme.io/about".into(),
            content: content.into(),
            score: 0.9,
        }
    }

    #[test]
    fn extracts_structured_fields() {
        let snippets = vec![snippet(
            "Acme is an aerospace company founded in 1999, headquartered in Denver, Colorado. \
             It has 1,200 employees. Follow us at https://linkedin.com/company/acme-io and \
             https://x.com/acmeio.",
        )];

        let raw = extract_from_snippets(&identity(), &snippets).unwrap();
        assert_eq!(raw.founded_year.as_deref(), Some("1999"));
        assert_eq!(raw.location.as_deref(), Some("Denver, Colorado"));
        assert_eq!(raw.company_size.as_deref(), Some("1,200 employees"));
        assert_eq!(raw.industry.as_deref(), Some("Aerospace"));
        assert_eq!(
            raw.linkedin.as_deref(),
            Some("https://linkedin.com/company/acme-io")
        );
        assert_eq!(raw.twitter.as_deref(), Some("https://x.com/acmeio"));
        assert!(!raw.ai_generated);
        assert!(raw.description.is_some());
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        let snippets = vec![snippet("Totally unrelated text about cooking recipes.")];
        assert!(extract_from_snippets(&identity(), &snippets).is_none());
    }

    #[test]
    fn description_requires_company_mention() {
        let snippets = vec![SearchSnippet {
            title: "Directory".into(),
            url: "https://listings.example".into(),
            content: "A company founded in 2005 doing things.".into(),
            score: 0.5,
        }];
        let raw = extract_from_snippets(&identity(), &snippets).unwrap();
        assert_eq!(raw.founded_year.as_deref(), Some("2005"));
        assert!(raw.description.is_none());
    }
}
