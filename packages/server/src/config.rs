use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

use enrichment::limiter::RateLimits;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,

    /// Search-grounded completion endpoint (primary provider).
    pub ai_search_api_key: Option<String>,
    pub ai_search_base_url: String,
    pub ai_search_model: String,

    /// Plain completion endpoint used for structured extraction.
    pub extraction_api_key: Option<String>,
    pub extraction_base_url: String,
    pub extraction_model: String,

    /// Web search endpoint (secondary provider).
    pub search_api_key: Option<String>,
    pub search_base_url: String,

    pub jwt_secret: String,
    pub jwt_issuer: String,

    pub rate_limits: RateLimits,

    /// Mask domains in logs (production).
    pub scrub_logs: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            ai_search_api_key: env::var("AI_SEARCH_API_KEY").ok(),
            ai_search_base_url: env::var("AI_SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://api.perplexity.ai".to_string()),
            ai_search_model: env::var("AI_SEARCH_MODEL")
                .unwrap_or_else(|_| "sonar-pro".to_string()),
            extraction_api_key: env::var("EXTRACTION_API_KEY")
                .ok()
                .or_else(|| env::var("OPENAI_API_KEY").ok()),
            extraction_base_url: env::var("EXTRACTION_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            extraction_model: env::var("EXTRACTION_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            search_api_key: env::var("SEARCH_API_KEY")
                .ok()
                .or_else(|| env::var("TAVILY_API_KEY").ok()),
            search_base_url: env::var("SEARCH_BASE_URL")
                .unwrap_or_else(|_| "https://api.tavily.com".to_string()),
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "enrichment-api".to_string()),
            rate_limits: RateLimits {
                per_minute: parse_limit("RATE_LIMIT_PER_MINUTE", RateLimits::default().per_minute)?,
                per_day: parse_limit("RATE_LIMIT_PER_DAY", RateLimits::default().per_day)?,
                initial_balance: parse_limit(
                    "RATE_LIMIT_INITIAL_BALANCE",
                    RateLimits::default().initial_balance,
                )?,
            },
            scrub_logs: env::var("SCRUB_LOGS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn parse_limit(var: &str, default: i64) -> Result<i64> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{} must be a valid number", var)),
        Err(_) => Ok(default),
    }
}
