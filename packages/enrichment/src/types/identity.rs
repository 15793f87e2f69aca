//! Normalized company identity derived from a validated URL.

use serde::{Deserialize, Serialize};

/// A company identified by its canonical domain.
///
/// Produced once per request by the URL validator and immutable afterwards.
/// The domain is lowercase, has no `www.` prefix, and has already passed
/// the SSRF checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// Canonical domain, e.g. `acme.io`
    pub domain: String,

    /// Display name derived from the first DNS label, e.g. `Acme`
    pub display_name: String,
}

impl CompanyIdentity {
    pub fn new(domain: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            display_name: display_name.into(),
        }
    }
}

impl std::fmt::Display for CompanyIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.domain)
    }
}
