use crate::auth::jwt::{validate_access_token, ACCESS_TOKEN_COOKIE};
use crate::auth::models::AuthUser;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use memos_core::AppError;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub jwt_secret: String,
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn token_from_header(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(Some(token.to_string()))
        }
        _ => Err(AppError::Unauthorized(
            "Authorization header format must be Bearer {token}".to_string(),
        )),
    }
}

/// Cookie first, then `Authorization: Bearer`.
fn find_access_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    match token_from_cookie(headers) {
        Some(token) => Ok(Some(token)),
        None => token_from_header(headers),
    }
}

/// Attach the caller's identity when a token is present.
///
/// Anonymous requests pass through; routes that need a user reject them via
/// the `AuthUser` extractor. A present but invalid token is always a 401.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = match find_access_token(request.headers()) {
        Ok(token) => token,
        Err(e) => return HttpAppError(e).into_response(),
    };

    if let Some(token) = token {
        match validate_access_token(&token, &auth_state.jwt_secret) {
            Ok(user_id) => {
                request.extensions_mut().insert(AuthUser { user_id });
            }
            Err(e) => {
                tracing::debug!(error = %e, "Rejected access token");
                return HttpAppError(e).into_response();
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; memos.access-token=abc"),
        );
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(find_access_token(&headers).unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer xyz"));
        assert_eq!(find_access_token(&headers).unwrap().as_deref(), Some("xyz"));
    }

    #[test]
    fn test_malformed_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token xyz"));
        assert!(find_access_token(&headers).is_err());
    }

    #[test]
    fn test_no_token() {
        assert_eq!(find_access_token(&HeaderMap::new()).unwrap(), None);
    }
}
