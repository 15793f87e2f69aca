mod enrich;
mod health;

pub use enrich::{enrich_handler, ApiError, EnrichBody, EnrichResponse};
pub use health::health_handler;
