//! Log scrubbing for tenant data.
//!
//! In production mode literal domains and URLs are replaced with masked
//! equivalents before reaching shared logs. The mask keeps the first two
//! characters and the TLD so operators can still correlate entries.

/// Mask a domain: `acme.io` -> `ac**.io`.
pub fn mask_domain(domain: &str) -> String {
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return "*".repeat(domain.chars().count().max(3));
    }

    let tld = labels[labels.len() - 1];
    let first = labels[0];
    let visible: String = first.chars().take(2).collect();
    let hidden = first.chars().count().saturating_sub(2).max(1);

    format!("{}{}.{}", visible, "*".repeat(hidden), tld)
}

/// Mask a URL down to its masked host: everything else is dropped.
pub fn mask_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}://{}/…", parsed.scheme(), mask_domain(host)),
            None => "<masked-url>".to_string(),
        },
        Err(_) => "<masked-url>".to_string(),
    }
}
