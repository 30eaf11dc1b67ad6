//! Short-lived signed token for Kling API calls.
//!
//! The vendor authenticates with an HS256 JWT whose claims are derived from
//! the caller's access/secret key pair. Tokens are issued fresh for every
//! tool invocation and expire purely by time; there is no revocation.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// Token lifetime in seconds.
const TOKEN_TTL_SECS: u64 = 1800;
/// Clock-skew allowance applied to the not-before claim.
const NOT_BEFORE_SKEW_SECS: u64 = 5;

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub exp: u64,
    pub nbf: u64,
}

/// Issue a compact signed token for one API invocation.
pub fn issue_token(access_key: &str, secret_key: &str) -> Result<String, TokenError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| TokenError::Clock(e.to_string()))?
        .as_secs();

    let claims = TokenClaims {
        iss: access_key.to_string(),
        exp: now + TOKEN_TTL_SECS,
        nbf: now.saturating_sub(NOT_BEFORE_SKEW_SECS),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret_key.as_bytes()),
    )
    .map_err(|e| TokenError::Signing(e.to_string()))
}
