//! Resolves the caller of a protected route into an [`AuthenticatedPrincipal`].

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use platform_api::ApiError;
use platform_authn::{AuthConfig, decode_token};
use time::Duration as TimeDuration;
use tracing::debug;

use crate::http::AppState;

pub const AUTH_COOKIE: &str = "Authorization";

/// Accepts `Bearer <jwt>`, a bare `<jwt>` header, or the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    {
        let value = value.trim();
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value)
            .trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn require_principal(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization token".into()))?;
    let claims = decode_token(&token, &state.auth).map_err(|err| {
        debug!(error = %err, "rejected session token");
        ApiError::Unauthorized("Invalid or expired token".into())
    })?;
    let principal = state
        .taskboard
        .resolve_principal(&claims.principal())
        .await?
        .ok_or_else(|| {
            debug!(user_id = claims.sub, "session for a deleted user");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;
    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

pub fn session_cookie(token: &str, config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::minutes(config.session_ttl_minutes))
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_raw_and_cookie_tokens_are_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc.def"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("Authorization=xyz"));
        assert_eq!(extract_token(&headers).as_deref(), Some("xyz"));

        assert_eq!(extract_token(&HeaderMap::new()), None);
    }
}
