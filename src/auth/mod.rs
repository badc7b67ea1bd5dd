//! Session tokens issued on behalf of the external identity provider.
//!
//! The OAuth exchange itself happens elsewhere; once the provider vouches for
//! a caller, the session carries the caller's identifier as an HS256 JWT.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Caller identifier compared against resource owner fields.
    pub sub: String,
    /// Display name from the identity provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: impl Into<String>, name: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id.into(),
            name,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session secret not configured")]
    MissingSecret,
    #[error("Session token has no subject")]
    MissingSubject,
    #[error("Invalid session token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

pub fn issue_session_token(
    security: &SecurityConfig,
    user_id: impl Into<String>,
    name: Option<String>,
) -> Result<String, SessionError> {
    if security.session_secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let claims = Claims::new(user_id, name, security.session_expiry_hours);
    if claims.sub.trim().is_empty() {
        return Err(SessionError::MissingSubject);
    }

    let key = EncodingKey::from_secret(security.session_secret.as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

pub fn decode_session_token(security: &SecurityConfig, token: &str) -> Result<Claims, SessionError> {
    if security.session_secret.is_empty() {
        return Err(SessionError::MissingSecret);
    }

    let key = DecodingKey::from_secret(security.session_secret.as_bytes());
    let data = decode::<Claims>(token, &key, &Validation::default())?;
    if data.claims.sub.trim().is_empty() {
        return Err(SessionError::MissingSubject);
    }
    Ok(data.claims)
}
