use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A signed-in administrator as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: String,
}

/// Login form posted by the panel.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Login request payload for API clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@kony.local")]
    pub email: String,
    pub password: String,
}

/// Token response after successful login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// JWT Claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // identity uid
    pub email: String,
    pub exp: usize,
    pub iat: usize,
    pub token_type: String, // "session"
}
