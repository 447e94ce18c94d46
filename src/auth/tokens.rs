//! Signed, expiring tokens for password reset and email verification.
//!
//! Tokens are JWTs signed with HMAC-SHA256: three base64url segments
//! (`header.claims.signature`). Every token carries an `aud` naming its
//! purpose and an `exp` in seconds since the epoch; decoding checks the
//! signature first, then audience, then expiry.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const RESET_PASSWORD_AUDIENCE: &str = "user_auth:reset";
pub const VERIFY_AUDIENCE: &str = "user_auth:verify";

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid signature")]
    BadSignature,
    #[error("wrong audience")]
    WrongAudience,
    #[error("token expired")]
    Expired,
}

/// Claims of a password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub sub: String,
    pub password_fgpt: String,
    pub aud: String,
    pub exp: i64,
}

/// Claims of an email-verification token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyClaims {
    pub sub: String,
    pub email: String,
    pub aud: String,
    pub exp: i64,
}

#[derive(Deserialize)]
struct Registered {
    aud: String,
    exp: i64,
}

/// Expiry timestamp `lifetime` from now.
pub fn expires_in(lifetime: Duration) -> i64 {
    (Utc::now() + lifetime).timestamp()
}

fn sign(message: &[u8], secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can accept any key length");
    mac.update(message);
    mac
}

pub fn encode<C: Serialize>(claims: &C, secret: &str) -> Result<String, TokenError> {
    let claims = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(HEADER),
        URL_SAFE_NO_PAD.encode(claims)
    );
    let signature = sign(signing_input.as_bytes(), secret).finalize().into_bytes();
    Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
}

pub fn decode<C: DeserializeOwned>(
    token: &str,
    secret: &str,
    audience: &str,
) -> Result<C, TokenError> {
    let (signing_input, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let (_, claims) = signing_input.split_once('.').ok_or(TokenError::Malformed)?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;
    sign(signing_input.as_bytes(), secret)
        .verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let claims = URL_SAFE_NO_PAD
        .decode(claims)
        .map_err(|_| TokenError::Malformed)?;
    let registered: Registered =
        serde_json::from_slice(&claims).map_err(|_| TokenError::Malformed)?;
    if registered.aud != audience {
        return Err(TokenError::WrongAudience);
    }
    if registered.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    serde_json::from_slice(&claims).map_err(|_| TokenError::Malformed)
}
