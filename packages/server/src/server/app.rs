//! Application setup and server configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use enrichment::{Enricher, RetryPolicy};

use crate::server::middleware::{jwt_auth_middleware, JwtService};
use crate::server::routes::{enrich_handler, health_handler};

/// Upstream calls one enrich request can make before the terminal
/// fallback: research plus extraction on the primary provider, search
/// plus extraction on the secondary.
const MAX_UPSTREAM_CALLS: u32 = 4;

/// Slack for everything outside the provider chain (auth, stores, IO).
const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Outer request deadline. Must outlast the provider chain's full
/// retry/timeout budget so an exhausted chain still returns the fallback
/// body instead of being cut off mid-flight.
fn request_timeout() -> Duration {
    RetryPolicy::default().max_elapsed() * MAX_UPSTREAM_CALLS + REQUEST_TIMEOUT_MARGIN
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub enricher: Arc<Enricher>,
    pub jwt_service: Arc<JwtService>,
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, enricher: Arc<Enricher>, jwt_service: Arc<JwtService>) -> Router {
    let app_state = AppState {
        db_pool: pool,
        enricher,
        jwt_service: jwt_service.clone(),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/enrich", post(enrich_handler))
        // Health check (no auth)
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout()))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_timeout_outlasts_the_provider_chain_budget() {
        // A chain where every upstream call burns its whole budget must
        // still finish inside the outer deadline.
        let chain_budget = RetryPolicy::default().max_elapsed() * MAX_UPSTREAM_CALLS;
        assert!(request_timeout() > chain_budget);
    }
}
