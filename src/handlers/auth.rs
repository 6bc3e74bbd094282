//! Token authentication middleware
//!
//! Resolves the presented token into an [`AuthUser`] request extension for
//! the protected routes.

use axum::{
    extract::{Request, State},
    http::{
        header::{AUTHORIZATION, COOKIE},
        HeaderMap,
    },
    middleware::Next,
    response::Response,
};

use crate::entities::{tokens, users};
use crate::error::ApiError;
use crate::services::auth::AuthError;
use crate::AppState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Caller resolved from a valid token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: users::Model,
    pub token: tokens::Model,
}

/// Token key from `Authorization: Bearer|Token <key>`, else the `auth_token` cookie
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let from_header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| {
            let mut parts = value.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(scheme), Some(key), None)
                    if scheme.eq_ignore_ascii_case("bearer")
                        || scheme.eq_ignore_ascii_case("token") =>
                {
                    Some(key.to_string())
                }
                _ => None,
            }
        });

    from_header.or_else(|| {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == AUTH_COOKIE)
            .map(|(_, key)| key.trim().to_string())
            .filter(|key| !key.is_empty())
    })
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = extract_token(request.headers()).ok_or(AuthError::Missing)?;

    let (token, user) = state.tokens.validate(&key).await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected token");
        e
    })?;

    request.extensions_mut().insert(AuthUser { user, token });
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(axum::http::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_bearer_and_token_schemes() {
        assert_eq!(
            extract_token(&headers(&[(AUTHORIZATION, "Bearer abc123")])).as_deref(),
            Some("abc123")
        );
        assert_eq!(
            extract_token(&headers(&[(AUTHORIZATION, "Token abc123")])).as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_token(&headers(&[(AUTHORIZATION, "Basic abc123")])), None);
        assert_eq!(extract_token(&headers(&[(AUTHORIZATION, "Bearer")])), None);
    }

    #[test]
    fn test_cookie_fallback() {
        let map = headers(&[(COOKIE, "theme=dark; auth_token=feedbeef; other=1")]);
        assert_eq!(extract_token(&map).as_deref(), Some("feedbeef"));
        assert_eq!(extract_token(&headers(&[(COOKIE, "auth_token=")])), None);
        assert_eq!(extract_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let map = headers(&[(AUTHORIZATION, "Bearer fromheader"), (COOKIE, "auth_token=fromcookie")]);
        assert_eq!(extract_token(&map).as_deref(), Some("fromheader"));
    }
}
