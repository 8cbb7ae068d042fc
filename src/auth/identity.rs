//! Identity providers verifying administrator credentials.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use super::model::Identity;
use crate::config::AdminCredentials;

const FIREBASE_SIGN_IN_URL: &str =
    "https://identitytoolkit.googleapis.com/v1/accounts:signInWithPassword";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
}

/// Firebase Authentication email/password sign-in.
pub struct FirebaseIdentity {
    api_key: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: String,
}

impl FirebaseIdentity {
    pub fn new(api_key: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            http_client,
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let response = self
            .http_client
            .post(FIREBASE_SIGN_IN_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true
            }))
            .send()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Sign-in rejected for {}: {}", email, body.trim());
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::Unavailable(format!("identity service responded {}", status)));
        }

        let signed_in: SignInResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        Ok(Identity {
            uid: signed_in.local_id,
            email: signed_in.email,
        })
    }
}

/// A single configured administrator, for demo mode and tests.
pub struct StaticIdentity {
    credentials: AdminCredentials,
}

impl StaticIdentity {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if email.trim().eq_ignore_ascii_case(&self.credentials.email)
            && password == self.credentials.password
        {
            Ok(Identity {
                uid: "static-admin".to_string(),
                email: self.credentials.email.clone(),
            })
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}
