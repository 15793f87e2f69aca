//! Test doubles for the provider chain.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::providers::{EnrichmentProvider, RawProfile};
use crate::types::{CompanyIdentity, ProfileSource};

/// What a [`MockProvider`] does when called.
#[derive(Clone)]
pub enum MockBehavior {
    /// Return this profile.
    Profile(Box<RawProfile>),
    /// Return `Ok(None)`.
    Empty,
    /// Return this error.
    Fail(ProviderError),
}

/// Scriptable provider that counts its invocations.
pub struct MockProvider {
    name: String,
    source: ProfileSource,
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(name: &str, source: ProfileSource, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            source,
            behavior,
            calls: AtomicUsize::new(0),
        })
    }

    /// Full profile with every field populated.
    pub fn complete_profile() -> RawProfile {
        RawProfile {
            description: Some(
                "Acme builds modular launch vehicles for small satellite operators.".into(),
            ),
            industry: Some("Aerospace".into()),
            location: Some("Denver, Colorado".into()),
            company_size: Some("1,200 employees".into()),
            founded_year: Some("1999".into()),
            key_people: vec![serde_json::json!({"name": "Jo Ruiz", "title": "CEO"})],
            product_summary: Some("Small-lift launch services and orbital logistics.".into()),
            linkedin: Some("https://linkedin.com/company/acme-io".into()),
            twitter: Some("https://x.com/acmeio".into()),
            github: None,
            citation_urls: vec!["https://acme.io/about".into()],
            ai_generated: true,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrichmentProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> ProfileSource {
        self.source
    }

    async fn try_enrich(
        &self,
        _identity: &CompanyIdentity,
    ) -> Result<Option<RawProfile>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            MockBehavior::Profile(raw) => Ok(Some((**raw).clone())),
            MockBehavior::Empty => Ok(None),
            MockBehavior::Fail(err) => Err(err.clone()),
        }
    }
}
