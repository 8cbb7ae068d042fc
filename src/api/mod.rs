//! JSON API over the same operations as the panel, for scripts and tooling.

pub mod handlers;
mod mod_tests;

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use thiserror::Error;

use crate::auth::SessionError;
use crate::document::GeneratorError;
use crate::report::{UnknownStatus, WorkflowError};
use crate::store::StoreError;
use crate::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0}")]
    InvalidStatus(#[from] UnknownStatus),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GeneratorError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Session(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            ApiError::Workflow(WorkflowError::InvalidTransition { .. })
            | ApiError::Workflow(WorkflowError::Store(StoreError::Conflict(_)))
            | ApiError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Workflow(WorkflowError::Store(StoreError::NotFound(_)))
            | ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Workflow(WorkflowError::Store(_)) | ApiError::Store(_) => {
                StatusCode::BAD_GATEWAY
            }
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = self.to_string();
        let body = match status {
            StatusCode::UNAUTHORIZED => ErrorResponse::new("Unauthorized", &message),
            StatusCode::BAD_REQUEST => ErrorResponse::bad_request(&message),
            StatusCode::CONFLICT => ErrorResponse::conflict(&message),
            StatusCode::NOT_FOUND => ErrorResponse::not_found(&message),
            StatusCode::BAD_GATEWAY => ErrorResponse::bad_gateway(&message),
            _ => ErrorResponse::internal_error(&message),
        };
        HttpResponse::build(status).json(body)
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/auth/login", web::post().to(crate::auth::handlers::api_login))
        .route("/reports", web::get().to(handlers::list_reports))
        .service(
            web::resource("/reports/{id}")
                .route(web::get().to(handlers::get_report))
                .route(web::delete().to(handlers::delete_report)),
        )
        .route(
            "/reports/{id}/status",
            web::put().to(handlers::update_status),
        )
        .route("/reports/{id}/pdf", web::get().to(handlers::report_pdf));
}
