use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

use super::jwt::JwtKeys;
use crate::{error::AppError, state::AppState};

/// Extracts and validates the bearer token, yielding the caller's email.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys).map(AuthUser)
    }
}

fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<String, AppError> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    // Expect "Bearer <token>"
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    match keys.verify(token.trim()) {
        Ok(claims) => Ok(claims.email),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            Err(AppError::Unauthorized("Invalid or expired token".into()))
        }
    }
}

/// Guards document writes. A no-op unless `auth_required_for_writes` is enabled.
pub async fn require_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.config.auth_required_for_writes {
        let keys = JwtKeys::from_ref(&state);
        let email = authenticate(request.headers(), &keys)?;
        debug!(email = %email, method = %request.method(), path = %request.uri().path(), "write authorized");
    }
    Ok(next.run(request).await)
}
