// Telegram WebApp authentication.
//
// Two halves: verifying the signed init data the Mini App hands us on
// startup, and minting/checking the JWT session token the client uses
// for every authenticated call afterwards.
//
// Init-data verification follows the Bot API contract: the secret key
// is HMAC-SHA256 of the bot token with the literal key "WebAppData",
// the data-check string is every field except `hash` sorted by key and
// joined with newlines, and the client-supplied hash must match the
// HMAC of that string in constant time.

use chrono::Utc;
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::core::profiles::TgUser;

type HmacSha256 = Hmac<Sha256>;

/// Init data older than this is rejected as a replay.
const INIT_DATA_MAX_AGE_SECS: i64 = 24 * 60 * 60;

/// How long a session token stays valid.
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("init data is malformed")]
    Malformed,

    #[error("init data signature mismatch")]
    BadSignature,

    #[error("init data is too old")]
    Expired,

    #[error("session token is invalid or expired")]
    BadToken,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Telegram user id.
    sub: u64,
    exp: i64,
    iat: i64,
}

/// Verify Mini App init data against the bot token and pull out the
/// authenticated user.
pub fn verify_init_data(bot_token: &str, init_data: &str) -> Result<TgUser, AuthError> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut provided_hash: Option<String> = None;

    for part in init_data.split('&') {
        let (key, value) = part.split_once('=').ok_or(AuthError::Malformed)?;
        let value = urlencoding::decode(value)
            .map_err(|_| AuthError::Malformed)?
            .into_owned();
        if key == "hash" {
            provided_hash = Some(value);
        } else {
            pairs.push((key.to_string(), value));
        }
    }

    let provided_hash = provided_hash.ok_or(AuthError::Malformed)?;
    let provided = hex::decode(&provided_hash).map_err(|_| AuthError::Malformed)?;

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let check_string = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    // secret = HMAC(key = "WebAppData", message = bot_token)
    let mut secret_mac =
        HmacSha256::new_from_slice(b"WebAppData").map_err(|_| AuthError::Malformed)?;
    secret_mac.update(bot_token.as_bytes());
    let secret = secret_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret).map_err(|_| AuthError::Malformed)?;
    mac.update(check_string.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| AuthError::BadSignature)?;

    let auth_date: i64 = pairs
        .iter()
        .find(|(k, _)| k == "auth_date")
        .and_then(|(_, v)| v.parse().ok())
        .ok_or(AuthError::Malformed)?;
    if Utc::now().timestamp() - auth_date > INIT_DATA_MAX_AGE_SECS {
        return Err(AuthError::Expired);
    }

    let user_json = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or(AuthError::Malformed)?;
    serde_json::from_str(user_json).map_err(|_| AuthError::Malformed)
}

/// Mint a session token for a verified user.
pub fn issue_session(secret: &str, user_id: u64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + SESSION_TTL_SECS,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::BadToken)
}

/// Check a session token and return the user id it was issued for.
pub fn verify_session(secret: &str, token: &str) -> Result<u64, AuthError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AuthError::BadToken)?;
    Ok(data.claims.sub)
}
