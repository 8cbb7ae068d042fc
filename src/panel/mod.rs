//! Server-rendered admin panel: report tabs, cards and their actions.

pub mod cards;
pub mod handlers;
pub mod html;

pub use cards::{ActionKind, CardAction, ReportCard};

use actix_web::http::StatusCode;
use actix_web::web;
use thiserror::Error;

use crate::report::{UnknownStatus, WorkflowError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("{0}")]
    InvalidStatus(#[from] UnknownStatus),
    #[error("{0}")]
    Workflow(#[from] WorkflowError),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl PanelError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PanelError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
            PanelError::Workflow(WorkflowError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            PanelError::Workflow(WorkflowError::Store(e)) | PanelError::Store(e) => {
                store_status(e)
            }
        }
    }
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Read(_) | StoreError::Write(_) => StatusCode::BAD_GATEWAY,
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::index))
        .route("/reports", web::get().to(handlers::list_reports))
        .route(
            "/reports/{id}/status",
            web::post().to(handlers::advance_status),
        )
        .service(
            web::resource("/reports/{id}/delete")
                .route(web::get().to(handlers::confirm_delete))
                .route(web::post().to(handlers::delete_report)),
        );
}
