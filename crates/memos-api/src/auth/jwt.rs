//! HS256 access tokens
//!
//! Tokens are issued by the account service; this crate only validates them.
//! `generate_access_token` exists for that issuer and for tests.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use memos_core::AppError;
use serde::{Deserialize, Serialize};

pub const ISSUER: &str = "memos";
pub const KEY_ID: &str = "v1";
pub const ACCESS_TOKEN_AUDIENCE: &str = "user.access-token";
pub const ACCESS_TOKEN_COOKIE: &str = "memos.access-token";
pub const ACCESS_TOKEN_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    #[serde(default)]
    pub name: String,
    /// Checked by `Validation` against the raw token; may be a string or an array.
    #[serde(default, skip_deserializing)]
    pub aud: Vec<String>,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub iss: String,
    /// Decimal user id.
    pub sub: String,
}

pub fn generate_access_token(username: &str, user_id: i32, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = AccessTokenClaims {
        name: username.to_string(),
        aud: vec![ACCESS_TOKEN_AUDIENCE.to_string()],
        exp: (now + Duration::days(ACCESS_TOKEN_DAYS)).timestamp(),
        iat: now.timestamp(),
        iss: ISSUER.to_string(),
        sub: user_id.to_string(),
    };

    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KEY_ID.to_string());

    encode(&header, &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("Failed to generate access token: {}", e)))
}

/// Validate an access token and return the user id it was issued for.
pub fn validate_access_token(token: &str, secret: &str) -> Result<i32, AppError> {
    let header = decode_header(token)
        .map_err(|e| AppError::Unauthorized(format!("Invalid or expired access token: {}", e)))?;
    if header.kid.as_deref() != Some(KEY_ID) {
        return Err(AppError::Unauthorized(format!(
            "Unexpected access token kid={:?}",
            header.kid
        )));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[ACCESS_TOKEN_AUDIENCE]);
    validation.set_required_spec_claims(&["exp", "aud", "sub"]);

    let data = decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::Unauthorized(format!("Invalid or expired access token: {}", e)))?;

    data.claims
        .sub
        .parse::<i32>()
        .map_err(|_| AppError::Unauthorized("Malformed ID in the token".to_string()))
}
