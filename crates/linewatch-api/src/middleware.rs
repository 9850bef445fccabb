use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use linewatch_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Decodes and validates a bearer token. Expired, forged, and malformed
/// all collapse into the same `Unauthorized`.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    Ok(token_data.claims)
}

/// Claims for routes that serve anonymous and signed-in callers alike.
/// A missing Authorization header means anonymous; a header that is
/// present but unusable is rejected, not downgraded to anonymous.
pub fn optional_claims(headers: &HeaderMap, secret: &str) -> Result<Option<Claims>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = value
        .to_str()
        .ok()
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    verify_token(token, secret).map(Some)
}

/// Extract and validate JWT from the Authorization header, then stash the
/// claims as a request extension for the handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims = verify_token(token, &state.jwt_secret)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
