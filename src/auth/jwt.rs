use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::env;

use super::model::{Claims, Identity};

const DEFAULT_JWT_SECRET: &str = "kony-admin-jwt-secret-change-in-production";
const SESSION_TOKEN_EXPIRY_SECONDS: i64 = 8 * 60 * 60; // 8 hours
pub const SESSION_TOKEN_TYPE: &str = "session";

fn get_jwt_secret() -> String {
    env::var("JWT_SECRET").unwrap_or_else(|_| {
        log::warn!("JWT_SECRET not set, using default secret. SET THIS IN PRODUCTION!");
        DEFAULT_JWT_SECRET.to_string()
    })
}

/// Issue a session token for a signed-in administrator.
pub fn generate_session_token(identity: &Identity) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: identity.uid.clone(),
        email: identity.email.clone(),
        exp: now + SESSION_TOKEN_EXPIRY_SECONDS as usize,
        iat: now,
        token_type: SESSION_TOKEN_TYPE.to_string(),
    };

    let secret = get_jwt_secret();
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate and decode a token
pub fn validate_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let secret = get_jwt_secret();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn get_session_token_expiry() -> i64 {
    SESSION_TOKEN_EXPIRY_SECONDS
}
