use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ApiError;
use crate::auth::validate_request_token;
use crate::document::GeneratorError;
use crate::report::{advance_status, Report, ReportStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatusQuery {
    /// `submitted`, `reviewed` or `approved`. Defaults to `submitted`.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    pub status: ReportStatus,
}

/// List reports of one status, newest submission first
#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(StatusQuery),
    responses(
        (status = 200, description = "Reports with the requested status", body = Vec<Report>),
        (status = 400, description = "Unknown status", body = crate::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::ErrorResponse),
        (status = 502, description = "Report store unavailable", body = crate::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_reports(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<StatusQuery>,
) -> Result<HttpResponse, ApiError> {
    validate_request_token(&req)?;
    let status = match query.status.as_deref() {
        Some(raw) => raw.parse::<ReportStatus>()?,
        None => ReportStatus::Submitted,
    };

    let reports = state.store.list_by_status(status).await?;
    Ok(HttpResponse::Ok().json(reports))
}

/// Get one report
#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report document id")),
    responses(
        (status = 200, description = "Report found", body = Report),
        (status = 401, description = "Unauthorized", body = crate::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_report(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    validate_request_token(&req)?;
    let report = state.store.get_by_id(&path).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Move a report to the next workflow stage
#[utoipa::path(
    put,
    path = "/api/reports/{id}/status",
    tag = "Reports",
    params(("id" = String, Path, description = "Report document id")),
    request_body = StatusUpdateRequest,
    responses(
        (status = 200, description = "Status updated", body = Report),
        (status = 401, description = "Unauthorized", body = crate::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::ErrorResponse),
        (status = 409, description = "Transition not allowed from the current status", body = crate::ErrorResponse),
        (status = 502, description = "Report store rejected the write", body = crate::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    validate_request_token(&req)?;
    let report_id = path.into_inner();

    advance_status(state.store.as_ref(), &report_id, body.status).await?;
    let report = state.store.get_by_id(&report_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Delete a report
#[utoipa::path(
    delete,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report document id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 401, description = "Unauthorized", body = crate::ErrorResponse),
        (status = 502, description = "Report store rejected the delete", body = crate::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_report(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let claims = validate_request_token(&req)?;
    state.store.delete_by_id(&path).await?;
    log::info!("Report {} deleted by {} through the API", path.as_str(), claims.email);
    Ok(HttpResponse::NoContent().finish())
}

/// Download the PDF of a report
#[utoipa::path(
    get,
    path = "/api/reports/{id}/pdf",
    tag = "Reports",
    params(("id" = String, Path, description = "Report document id")),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf", body = Vec<u8>),
        (status = 401, description = "Unauthorized", body = crate::ErrorResponse),
        (status = 404, description = "Report not found", body = crate::ErrorResponse),
        (status = 500, description = "PDF generation failed", body = crate::ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn report_pdf(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    validate_request_token(&req)?;
    let report = state.store.get_by_id(&path).await?;

    let generator = state.generator.clone();
    let document = tokio::task::spawn_blocking(move || generator.generate(&report))
        .await
        .map_err(|e| GeneratorError::Task(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename),
        ))
        .body(document.pdf))
}
