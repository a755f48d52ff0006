/// Authentication: salted password hashing, JWT issuance/verification,
/// and the extractor that resolves the current user id from a request.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::api::ErrorResponse;
use crate::state::AppState;

const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: i64,
    /// Expiry, seconds since the Unix epoch.
    exp: u64,
    /// "access" or "refresh".
    typ: String,
}

/// Issues and verifies HS256 tokens. Access and refresh tokens share the
/// signing key but carry distinct type claims, so one can never stand in
/// for the other.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenService {
    pub fn new(secret: &str, access_ttl_secs: u64, refresh_ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn issue_access(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue(user_id, TOKEN_TYPE_ACCESS, self.access_ttl_secs)
    }

    pub fn issue_refresh(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue(user_id, TOKEN_TYPE_REFRESH, self.refresh_ttl_secs)
    }

    fn issue(&self, user_id: i64, typ: &str, ttl_secs: u64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id,
            exp: now_secs() + ttl_secs,
            typ: typ.to_string(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify an access token and return the user id it names.
    pub fn verify_access(&self, token: &str) -> Result<i64, AuthError> {
        self.verify(token, TOKEN_TYPE_ACCESS)
    }

    /// Verify a refresh token and return the user id it names.
    pub fn verify_refresh(&self, token: &str) -> Result<i64, AuthError> {
        self.verify(token, TOKEN_TYPE_REFRESH)
    }

    fn verify(&self, token: &str, expected_typ: &str) -> Result<i64, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| AuthError::InvalidToken)?;
        if data.claims.typ != expected_typ {
            return Err(AuthError::WrongTokenType);
        }
        Ok(data.claims.sub)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

/// Hash a password as `salt$hexdigest` with a fresh random salt.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

/// Check a password against a stored `salt$hexdigest` value.
pub fn verify_password(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, stored_digest)) => digest(salt, password) == stored_digest,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Wrong token type")]
    WrongTokenType,

    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// The authenticated caller, extracted from the Authorization header.
pub struct AuthUser(pub i64);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            unauthorized(AuthError::MissingToken.to_string())
        })?;
        let user_id = state
            .tokens
            .verify_access(token)
            .map_err(|e| unauthorized(e.to_string()))?;
        Ok(AuthUser(user_id))
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn unauthorized(error: String) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse { error }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 900, 3600)
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let stored = hash_password("hunter22");
        assert!(verify_password(&stored, "hunter22"));
        assert!(!verify_password(&stored, "hunter23"));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn test_malformed_stored_hash_rejects() {
        assert!(!verify_password("no-dollar-sign", "anything"));
    }

    #[test]
    fn test_access_token_roundtrip() {
        let tokens = service();
        let token = tokens.issue_access(42).unwrap();
        assert_eq!(tokens.verify_access(&token).unwrap(), 42);
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let tokens = service();
        let refresh = tokens.issue_refresh(7).unwrap();
        assert!(matches!(
            tokens.verify_access(&refresh),
            Err(AuthError::WrongTokenType)
        ));
        assert_eq!(tokens.verify_refresh(&refresh).unwrap(), 7);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = TokenService::new("other-secret", 900, 3600)
            .issue_access(1)
            .unwrap();
        assert!(matches!(
            service().verify_access(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        assert!(service().verify_access("not.a.jwt").is_err());
    }
}
