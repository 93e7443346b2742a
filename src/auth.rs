//! Admin gate for the catalog surface.
//!
//! Callers present a bearer JWT signed with the shared HMAC secret
//! (`QUIZ_ADMIN_JWT_SECRET`). The token must carry a `role` claim of
//! `admin` and an unexpired `exp`. Everything else is rejected with
//! `Unauthorized` — the gate fails closed.

use std::env;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, Result};

pub const ADMIN_ROLE: &str = "admin";

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin identifier).
    pub sub: String,
    /// Caller role; must be `admin` for this surface.
    pub role: String,
    /// Expiration time (Unix timestamp).
    pub exp: u64,
}

/// Verifies admin bearer tokens.
pub struct AdminAuth {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AdminAuth {
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = env::var("QUIZ_ADMIN_JWT_SECRET").map_err(|_| {
            CatalogError::Config("QUIZ_ADMIN_JWT_SECRET environment variable not set".to_string())
        })?;
        Ok(Self::from_secret(&secret))
    }

    /// Verify an `Authorization` header value and require the admin role.
    pub fn admin_required(&self, header_value: &str) -> Result<AdminPrincipal> {
        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(CatalogError::Unauthorized)?;

        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| CatalogError::Unauthorized)?;

        if data.claims.role != ADMIN_ROLE {
            return Err(CatalogError::Unauthorized);
        }

        Ok(AdminPrincipal {
            subject: data.claims.sub,
        })
    }
}

/// The authenticated admin caller. Extracting this from a request performs
/// the admin check; handlers that take it cannot run unauthenticated.
#[derive(Debug, Clone)]
pub struct AdminPrincipal {
    pub subject: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminPrincipal
where
    S: Send + Sync,
{
    type Rejection = CatalogError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth = parts
            .extensions
            .get::<Arc<AdminAuth>>()
            .cloned()
            .ok_or(CatalogError::Unauthorized)?;

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(CatalogError::Unauthorized)?;

        auth.admin_required(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(secret: &str, role: &str) -> String {
        let claims = Claims {
            sub: "admin-1".to_string(),
            role: role.to_string(),
            exp: (chrono::Utc::now().timestamp() + 3600) as u64,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn admin_token_passes() {
        let auth = AdminAuth::from_secret("sekrit");
        let header = format!("Bearer {}", token("sekrit", "admin"));

        let principal = auth.admin_required(&header).unwrap();
        assert_eq!(principal.subject, "admin-1");
    }

    #[test]
    fn non_admin_role_is_rejected() {
        let auth = AdminAuth::from_secret("sekrit");
        let header = format!("Bearer {}", token("sekrit", "player"));

        assert!(matches!(
            auth.admin_required(&header),
            Err(CatalogError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let auth = AdminAuth::from_secret("sekrit");
        let header = format!("Bearer {}", token("other", "admin"));

        assert!(matches!(
            auth.admin_required(&header),
            Err(CatalogError::Unauthorized)
        ));
    }

    #[test]
    fn missing_bearer_prefix_is_rejected() {
        let auth = AdminAuth::from_secret("sekrit");

        assert!(matches!(
            auth.admin_required("Basic abc"),
            Err(CatalogError::Unauthorized)
        ));
    }
}
