use std::sync::Arc;

use anyhow::Result;
use axum::{middleware::Next, response::Response};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,           // Subject (caller identity)
    pub tenant_ids: Vec<Uuid>, // Tenants this caller may enrich for
    pub is_admin: bool,        // Admin flag (may act for any tenant)
    pub exp: i64,              // Expiration timestamp
    pub iat: i64,              // Issued at timestamp
    pub iss: String,           // Issuer
    pub jti: String,           // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies JWT tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new JWT service with secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Create a new JWT token for a caller
    ///
    /// Token expires after 24 hours
    pub fn create_token(
        &self,
        subject: &str,
        tenant_ids: Vec<Uuid>,
        is_admin: bool,
    ) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = Claims {
            sub: subject.to_string(),
            tenant_ids,
            is_admin,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token
    ///
    /// Returns claims if token is valid and not expired
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(Into::into)
    }
}

/// Authenticated caller information from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub subject: String,
    pub tenant_ids: Vec<Uuid>,
    pub is_admin: bool,
}

impl AuthUser {
    /// Whether this caller may enrich on behalf of `tenant_id`.
    pub fn can_act_for(&self, tenant_id: Uuid) -> bool {
        self.is_admin || self.tenant_ids.contains(&tenant_id)
    }

    /// The tenant used when the request names none.
    pub fn default_tenant(&self) -> Option<Uuid> {
        self.tenant_ids.first().copied()
    }
}

/// JWT authentication middleware
///
/// Extracts JWT token from Authorization header, verifies it, and adds
/// AuthUser to request extensions. If no token or invalid token, the request
/// continues without AuthUser; protected handlers reject it there.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!(
            "Authenticated caller: {} (admin: {})",
            user.subject, user.is_admin
        );
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid authentication token");
    }

    next.run(request).await
}

/// Extract and verify JWT token from request
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str);

    let claims = jwt_service.verify_token(token).ok()?;

    Some(AuthUser {
        subject: claims.sub,
        tenant_ids: claims.tenant_ids,
        is_admin: claims.is_admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify_token() {
        let service = JwtService::new("test_secret_key", "test_issuer".to_string());
        let tenant = Uuid::new_v4();

        let token = service
            .create_token("integration-caller", vec![tenant], false)
            .unwrap();

        let claims = service.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "integration-caller");
        assert_eq!(claims.tenant_ids, vec![tenant]);
        assert!(!claims.is_admin);
        assert_eq!(claims.iss, "test_issuer");
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer".to_string());
        let service2 = JwtService::new("secret2", "test_issuer".to_string());

        let token = service1
            .create_token("caller", vec![Uuid::new_v4()], false)
            .unwrap();

        assert!(service2.verify_token(&token).is_err());
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let tenant = Uuid::new_v4();
        let token = jwt_service
            .create_token("caller", vec![tenant], true)
            .unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert!(auth_user.is_admin);
        assert!(auth_user.can_act_for(tenant));
        assert!(auth_user.can_act_for(Uuid::new_v4())); // admin
    }

    #[test]
    fn test_membership_check() {
        let member_tenant = Uuid::new_v4();
        let user = AuthUser {
            subject: "caller".into(),
            tenant_ids: vec![member_tenant],
            is_admin: false,
        };

        assert!(user.can_act_for(member_tenant));
        assert!(!user.can_act_for(Uuid::new_v4()));
        assert_eq!(user.default_tenant(), Some(member_tenant));
    }

    #[test]
    fn test_invalid_token() {
        let jwt_service = JwtService::new("test_secret", "test_issuer".to_string());
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_none());
    }
}
