use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::JwtKeys;
use crate::error::ApiError;

/// Identity decoded from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

/// Admits the request only with a valid `Authorization: Bearer <token>`.
/// Every failure is the same 401.
pub struct AuthUser(pub CurrentUser);

/// Pulls the token out of a `Bearer <token>` header value.
pub(crate) fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                ApiError::Unauthorized
            })?;

        let token = bearer_token(header).ok_or_else(|| {
            warn!("invalid auth scheme");
            ApiError::Unauthorized
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthorized
        })?;

        Ok(AuthUser(CurrentUser {
            id: claims.id,
            email: claims.email,
        }))
    }
}
