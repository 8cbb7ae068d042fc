use actix_web::http::{header, StatusCode};
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use super::jwt::{validate_token, SESSION_TOKEN_TYPE};
use super::model::Claims;
use crate::ErrorResponse;

pub const SESSION_COOKIE: &str = "kony_session";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Missing authorization token")]
    Missing,
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Invalid token type")]
    WrongType,
}

impl ResponseError for SessionError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::Unauthorized().json(ErrorResponse::new("Unauthorized", &self.to_string()))
    }
}

/// Extract token from the Authorization header, falling back to the session cookie
fn extract_token(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string());

    bearer.or_else(|| req.cookie(SESSION_COOKIE).map(|c| c.value().to_string()))
}

/// Validate token from HttpRequest and return claims
pub fn validate_request_token(req: &HttpRequest) -> Result<Claims, SessionError> {
    let token = extract_token(req).ok_or(SessionError::Missing)?;

    let claims = validate_token(&token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        SessionError::Invalid
    })?;

    if claims.token_type != SESSION_TOKEN_TYPE {
        return Err(SessionError::WrongType);
    }

    Ok(claims)
}

/// Panel pages send anonymous visitors to the login page instead of a 401.
pub fn require_panel_session(req: &HttpRequest) -> Result<Claims, HttpResponse> {
    validate_request_token(req).map_err(|e| {
        log::debug!("Redirecting {} to login: {}", req.path(), e);
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, "/login"))
            .finish()
    })
}
