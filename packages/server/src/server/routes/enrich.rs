//! POST /enrich - the enrichment endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use enrichment::types::{EnrichedProfile, EnrichmentRequest, ProfileSource};
use enrichment::EnrichmentError;

use crate::server::app::AppState;
use crate::server::middleware::AuthUser;

/// Candidate URLs per request; the first one that validates is enriched.
const MAX_URLS: usize = 3;

pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichBody {
    pub urls: Vec<String>,
    /// Defaults to the caller's first tenant when omitted
    pub tenant_id: Option<Uuid>,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichResponse {
    pub success: bool,
    pub enrichment: EnrichedProfile,
    pub provider: ProfileSource,
    pub cached: bool,
    pub duration_ms: u64,
    pub confidence: f64,
    pub is_fallback: bool,
    pub request_id: Uuid,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// API error carrying its HTTP status and the request id for correlation.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
    pub request_id: Uuid,
    pub headers: Vec<(HeaderName, String)>,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            request_id,
            headers: Vec::new(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
            "requestId": self.request_id,
        }));

        let mut response = (self.status, body).into_response();
        for (name, value) in self.headers {
            if let Ok(value) = value.parse() {
                response.headers_mut().insert(name, value);
            }
        }
        if let Ok(value) = self.request_id.to_string().parse() {
            response
                .headers_mut()
                .insert(REQUEST_ID_HEADER.clone(), value);
        }
        response
    }
}

/// Enrich a company profile from its website URL.
///
/// Accepts up to three candidate URLs; the first that passes validation is
/// enriched and the rest are ignored. Requires a valid JWT whose claims
/// cover the target tenant; the tenant comes from the `X-Tenant-Id` header
/// (or the body), defaulting to the caller's first tenant.
pub async fn enrich_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    headers: HeaderMap,
    Json(body): Json<EnrichBody>,
) -> Result<Response, ApiError> {
    let request_id = Uuid::new_v4();

    let Some(Extension(user)) = auth else {
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "A valid bearer token is required",
            request_id,
        ));
    };

    let requested_tenant = match headers.get("x-tenant-id") {
        Some(value) => Some(
            value
                .to_str()
                .ok()
                .and_then(|raw| raw.parse::<Uuid>().ok())
                .ok_or_else(|| {
                    ApiError::new(
                        StatusCode::BAD_REQUEST,
                        "invalid_request",
                        "X-Tenant-Id must be a UUID",
                        request_id,
                    )
                })?,
        ),
        None => body.tenant_id,
    };

    let tenant_id = match requested_tenant {
        Some(tenant_id) if user.can_act_for(tenant_id) => tenant_id,
        Some(_) => {
            return Err(ApiError::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Caller is not a member of the requested tenant",
                request_id,
            ));
        }
        None => user.default_tenant().ok_or_else(|| {
            ApiError::new(
                StatusCode::FORBIDDEN,
                "forbidden",
                "Token grants no tenant access",
                request_id,
            )
        })?,
    };

    tracing::info!(
        request_id = %request_id,
        tenant_id = %tenant_id,
        caller = %user.subject,
        candidates = body.urls.len(),
        "enrich request received"
    );

    if body.urls.is_empty() || body.urls.len() > MAX_URLS {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            format!("Provide between 1 and {} candidate URLs", MAX_URLS),
            request_id,
        ));
    }

    let mut validation_errors: Vec<String> = Vec::new();

    for url in &body.urls {
        let request = EnrichmentRequest::new(tenant_id, url)
            .with_cache(body.use_cache)
            .with_force_refresh(body.force_refresh);

        match state.enricher.enrich(&request).await {
            Ok(outcome) => {
                let response = EnrichResponse {
                    success: outcome.success,
                    confidence: outcome.profile.confidence,
                    enrichment: outcome.profile,
                    provider: outcome.provider,
                    cached: outcome.cached,
                    duration_ms: outcome.duration_ms,
                    is_fallback: outcome.is_fallback,
                    request_id,
                    warnings: outcome.warnings,
                };
                // Terminal fallback is still HTTP 200; clients branch on
                // success/isFallback, not on the status code.
                let mut http = (StatusCode::OK, Json(response)).into_response();
                if let Ok(value) = request_id.to_string().parse() {
                    http.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
                }
                return Ok(http);
            }
            Err(EnrichmentError::Validation(e)) => {
                validation_errors.push(e.to_string());
            }
            Err(EnrichmentError::RateLimited(decision)) => {
                let mut error = ApiError::new(
                    StatusCode::TOO_MANY_REQUESTS,
                    "rate_limited",
                    "Tenant quota exceeded",
                    request_id,
                );
                error.headers = vec![
                    (
                        HeaderName::from_static("retry-after"),
                        decision.retry_after_secs.to_string(),
                    ),
                    (
                        HeaderName::from_static("x-ratelimit-remaining-minute"),
                        decision.remaining_minute.to_string(),
                    ),
                    (
                        HeaderName::from_static("x-ratelimit-remaining-day"),
                        decision.remaining_day.to_string(),
                    ),
                ];
                return Err(error);
            }
            Err(EnrichmentError::NoProviders) => {
                return Err(ApiError::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "no_providers",
                    "No enrichment providers are configured",
                    request_id,
                ));
            }
        }
    }

    // Every candidate failed validation
    Err(ApiError::new(
        StatusCode::BAD_REQUEST,
        "invalid_url",
        validation_errors.join("; "),
        request_id,
    ))
}
