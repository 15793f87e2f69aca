//! Schema validation and confidence scoring.
//!
//! Normalizes raw provider output into the [`EnrichedProfile`] shape:
//! truncates to field limits (with warnings), validates the founding year
//! against a sane range, caps key people, and validates each social link
//! against a strict per-platform URL pattern so garbage links are never
//! stored.

use lazy_static::lazy_static;
use regex::Regex;

use crate::providers::{truncate_chars, RawProfile};
use crate::types::{EnrichedProfile, ProfileSource, SocialLinks};

pub const MAX_DESCRIPTION: usize = 2000;
pub const MAX_INDUSTRY: usize = 100;
pub const MAX_LOCATION: usize = 200;
pub const MAX_COMPANY_SIZE: usize = 100;
pub const MAX_PRODUCT_SUMMARY: usize = 2000;
pub const MAX_KEY_PEOPLE: usize = 10;
pub const MAX_PERSON_LEN: usize = 200;
pub const MAX_CITATIONS: usize = 5;
pub const MIN_FOUNDED_YEAR: i32 = 1800;

lazy_static! {
    static ref YEAR_RE: Regex = Regex::new(r"\b((?:18|19|20)\d{2})\b").unwrap();
    static ref LINKEDIN_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?linkedin\.com/(?:company|in)/[A-Za-z0-9\-_%.]+/?$")
            .unwrap();
    static ref TWITTER_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?(?:twitter|x)\.com/[A-Za-z0-9_]{1,15}/?$").unwrap();
    static ref GITHUB_RE: Regex =
        Regex::new(r"^https?://(?:www\.)?github\.com/[A-Za-z0-9][A-Za-z0-9\-]*/?$").unwrap();
}

/// Phrases that mark a nominally-successful answer as fallback quality.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "visit the company's website",
    "visit the company website",
    "visit their website",
    "no information available",
    "no information found",
    "unable to find",
    "could not find",
    "i don't have",
    "i do not have",
    "as an ai",
];

/// Per-field weights for the confidence score. Sums to 1.0.
const WEIGHT_DESCRIPTION: f64 = 0.25;
const WEIGHT_INDUSTRY: f64 = 0.15;
const WEIGHT_LOCATION: f64 = 0.15;
const WEIGHT_COMPANY_SIZE: f64 = 0.10;
const WEIGHT_FOUNDED_YEAR: f64 = 0.10;
const WEIGHT_KEY_PEOPLE: f64 = 0.10;
const WEIGHT_PRODUCT_SUMMARY: f64 = 0.05;
const WEIGHT_SOCIAL_LINKS: f64 = 0.10;

/// Normalize, validate and score raw provider output.
pub fn normalize(
    raw: RawProfile,
    source: ProfileSource,
    current_year: i32,
) -> (EnrichedProfile, Vec<String>) {
    let mut warnings = Vec::new();
    let ai_generated = raw.ai_generated;

    let mut profile = EnrichedProfile::empty(source, ai_generated);
    profile.description = clamp_field(raw.description, MAX_DESCRIPTION, "description", &mut warnings);
    profile.industry = clamp_field(raw.industry, MAX_INDUSTRY, "industry", &mut warnings);
    profile.location = clamp_field(raw.location, MAX_LOCATION, "location", &mut warnings);
    profile.company_size =
        clamp_field(raw.company_size, MAX_COMPANY_SIZE, "companySize", &mut warnings);
    profile.product_summary = clamp_field(
        raw.product_summary,
        MAX_PRODUCT_SUMMARY,
        "productSummary",
        &mut warnings,
    );

    profile.founded_year = raw
        .founded_year
        .as_deref()
        .and_then(|y| parse_founded_year(y, current_year, &mut warnings));

    profile.key_people = normalize_key_people(raw.key_people, &mut warnings);

    profile.social_links = SocialLinks {
        linkedin: validate_social(&LINKEDIN_RE, raw.linkedin, "linkedin", &mut warnings),
        twitter: validate_social(&TWITTER_RE, raw.twitter, "twitter", &mut warnings),
        github: validate_social(&GITHUB_RE, raw.github, "github", &mut warnings),
    };

    profile.citation_urls = raw.citation_urls.into_iter().take(MAX_CITATIONS).collect();
    profile.confidence = score(&profile);

    (profile, warnings)
}

/// Weighted confidence over the fixed per-field weights, rounded to two
/// decimal places; always in [0, 1].
pub fn score(profile: &EnrichedProfile) -> f64 {
    let mut total = 0.0;
    if non_empty(&profile.description) {
        total += WEIGHT_DESCRIPTION;
    }
    if non_empty(&profile.industry) {
        total += WEIGHT_INDUSTRY;
    }
    if non_empty(&profile.location) {
        total += WEIGHT_LOCATION;
    }
    if non_empty(&profile.company_size) {
        total += WEIGHT_COMPANY_SIZE;
    }
    if profile.founded_year.is_some() {
        total += WEIGHT_FOUNDED_YEAR;
    }
    if !profile.key_people.is_empty() {
        total += WEIGHT_KEY_PEOPLE;
    }
    if non_empty(&profile.product_summary) {
        total += WEIGHT_PRODUCT_SUMMARY;
    }
    if !profile.social_links.is_empty() {
        total += WEIGHT_SOCIAL_LINKS;
    }
    ((total * 100.0).round() / 100.0).clamp(0.0, 1.0)
}

/// Whether a normalized profile is fallback quality despite a nominal
/// provider success: placeholder text or nothing scored at all.
pub fn is_fallback_quality(profile: &EnrichedProfile) -> bool {
    if profile.confidence == 0.0 {
        return true;
    }
    match &profile.description {
        Some(description) => {
            let lowered = description.to_lowercase();
            PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m))
        }
        None => false,
    }
}

/// The terminal-fallback profile: confidence 0, flagged so callers can
/// tell "no data found" from "found but low quality".
pub fn fallback_profile() -> EnrichedProfile {
    EnrichedProfile::empty(ProfileSource::Fallback, true)
}

fn non_empty(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn clamp_field(
    value: Option<String>,
    max: usize,
    field: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() > max {
        warnings.push(format!("{} truncated to {} chars", field, max));
        Some(truncate_chars(trimmed, max).to_string())
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_founded_year(raw: &str, current_year: i32, warnings: &mut Vec<String>) -> Option<i32> {
    let year = YEAR_RE
        .captures(raw)
        .and_then(|caps| caps[1].parse::<i32>().ok());

    match year {
        Some(y) if (MIN_FOUNDED_YEAR..=current_year).contains(&y) => Some(y),
        Some(y) => {
            warnings.push(format!("foundedYear {} outside sane range, dropped", y));
            None
        }
        None => {
            warnings.push(format!("foundedYear '{}' not year-like, dropped", raw));
            None
        }
    }
}

fn normalize_key_people(
    people: Vec<serde_json::Value>,
    warnings: &mut Vec<String>,
) -> Vec<String> {
    if people.len() > MAX_KEY_PEOPLE {
        warnings.push(format!("keyPeople capped at {} entries", MAX_KEY_PEOPLE));
    }
    people
        .into_iter()
        .filter_map(|entry| match entry {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Object(map) => {
                let name = map.get("name").and_then(|v| v.as_str())?;
                match map
                    .get("title")
                    .or_else(|| map.get("role"))
                    .and_then(|v| v.as_str())
                {
                    Some(title) => Some(format!("{} ({})", name, title)),
                    None => Some(name.to_string()),
                }
            }
            _ => None,
        })
        .map(|person| truncate_chars(person.trim(), MAX_PERSON_LEN).to_string())
        .filter(|person| !person.is_empty())
        .take(MAX_KEY_PEOPLE)
        .collect()
}

fn validate_social(
    pattern: &Regex,
    url: Option<String>,
    platform: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let url = url?;
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return None;
    }
    if pattern.is_match(trimmed) {
        Some(trimmed.to_string())
    } else {
        warnings.push(format!("{} link rejected: not a profile URL", platform));
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i32 = 2026;

    fn raw_with_description() -> RawProfile {
        RawProfile {
            description: Some("Acme makes rockets.".into()),
            ..Default::default()
        }
    }

    #[test]
    fn description_only_scores_exactly_quarter() {
        let (profile, warnings) =
            normalize(raw_with_description(), ProfileSource::Primary, YEAR);
        assert_eq!(profile.confidence, 0.25);
        assert!(warnings.is_empty());
    }

    #[test]
    fn full_profile_scores_one() {
        let raw = RawProfile {
            description: Some("Acme makes rockets.".into()),
            industry: Some("Aerospace".into()),
            location: Some("Denver, CO".into()),
            founded_year: Some("1999".into()),
            company_size: Some("1,200 employees".into()),
            key_people: vec![serde_json::json!("Jane Doe (CEO)")],
            product_summary: Some("Reusable launch vehicles.".into()),
            linkedin: Some("https://linkedin.com/company/acme".into()),
            ..Default::default()
        };
        let (profile, _) = normalize(raw, ProfileSource::Primary, YEAR);
        assert_eq!(profile.confidence, 1.0);
    }

    #[test]
    fn truncates_long_fields_with_warning() {
        let raw = RawProfile {
            description: Some("x".repeat(3000)),
            ..Default::default()
        };
        let (profile, warnings) = normalize(raw, ProfileSource::Primary, YEAR);
        assert_eq!(profile.description.unwrap().chars().count(), MAX_DESCRIPTION);
        assert!(warnings.iter().any(|w| w.contains("description truncated")));
    }

    #[test]
    fn rejects_non_year_like_founded_values() {
        for bad in ["next year", "999", "2150", "since forever"] {
            let raw = RawProfile {
                founded_year: Some(bad.into()),
                ..Default::default()
            };
            let (profile, warnings) = normalize(raw, ProfileSource::Primary, YEAR);
            assert!(profile.founded_year.is_none(), "value: {}", bad);
            assert!(!warnings.is_empty());
        }

        let raw = RawProfile {
            founded_year: Some("founded in 1999".into()),
            ..Default::default()
        };
        let (profile, _) = normalize(raw, ProfileSource::Primary, YEAR);
        assert_eq!(profile.founded_year, Some(1999));
    }

    #[test]
    fn caps_key_people() {
        let raw = RawProfile {
            key_people: (0..15).map(|i| serde_json::json!(format!("Person {}", i))).collect(),
            ..Default::default()
        };
        let (profile, warnings) = normalize(raw, ProfileSource::Primary, YEAR);
        assert_eq!(profile.key_people.len(), MAX_KEY_PEOPLE);
        assert!(warnings.iter().any(|w| w.contains("keyPeople capped")));
    }

    #[test]
    fn rejects_garbage_social_links() {
        let raw = RawProfile {
            linkedin: Some("https://linkedin.com/feed/update/12345".into()),
            twitter: Some("https://example.com/not-twitter".into()),
            github: Some("https://github.com/acme".into()),
            ..Default::default()
        };
        let (profile, warnings) = normalize(raw, ProfileSource::Primary, YEAR);
        assert!(profile.social_links.linkedin.is_none());
        assert!(profile.social_links.twitter.is_none());
        assert_eq!(
            profile.social_links.github.as_deref(),
            Some("https://github.com/acme")
        );
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn accepts_valid_social_links() {
        let raw = RawProfile {
            linkedin: Some("https://www.linkedin.com/company/acme-io".into()),
            twitter: Some("https://x.com/acmeio".into()),
            ..Default::default()
        };
        let (profile, _) = normalize(raw, ProfileSource::Primary, YEAR);
        assert!(profile.social_links.linkedin.is_some());
        assert!(profile.social_links.twitter.is_some());
    }

    #[test]
    fn placeholder_text_is_fallback_quality() {
        let raw = RawProfile {
            description: Some("Please visit the company's website for details.".into()),
            ..Default::default()
        };
        let (profile, _) = normalize(raw, ProfileSource::Primary, YEAR);
        assert!(is_fallback_quality(&profile));

        let (real, _) = normalize(raw_with_description(), ProfileSource::Primary, YEAR);
        assert!(!is_fallback_quality(&real));
    }

    #[test]
    fn empty_profile_is_fallback_quality() {
        let (profile, _) = normalize(RawProfile::default(), ProfileSource::Primary, YEAR);
        assert_eq!(profile.confidence, 0.0);
        assert!(is_fallback_quality(&profile));
    }

    #[test]
    fn citations_capped_at_five() {
        let raw = RawProfile {
            description: Some("Acme makes rockets.".into()),
            citation_urls: (0..8).map(|i| format!("https://source{}.example", i)).collect(),
            ..Default::default()
        };
        let (profile, _) = normalize(raw, ProfileSource::Primary, YEAR);
        assert_eq!(profile.citation_urls.len(), MAX_CITATIONS);
    }

    #[test]
    fn fallback_profile_shape() {
        let profile = fallback_profile();
        assert_eq!(profile.confidence, 0.0);
        assert_eq!(profile.source, ProfileSource::Fallback);
        assert!(profile.ai_generated);
    }
}
