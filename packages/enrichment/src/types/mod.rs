//! Data types for the enrichment pipeline.

pub mod identity;
pub mod profile;
pub mod request;

pub use identity::CompanyIdentity;
pub use profile::{EnrichedProfile, ProfileSource, SocialLinks};
pub use request::{EnrichmentOutcome, EnrichmentRequest};
