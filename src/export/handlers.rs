//! Viewer endpoints of the PDF export flow.

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use serde::Deserialize;
use uuid::Uuid;

use super::ExportSnapshot;
use crate::auth::{require_panel_session, validate_request_token};
use crate::panel::handlers::{list_url, return_tab, see_other};
use crate::panel::html::{error_banner, escape_html, hidden_field, page, report_path};
use crate::report::ReportStatus;
use crate::state::AppState;
use crate::ErrorResponse;

#[derive(Debug, Deserialize)]
pub struct TabForm {
    pub tab: Option<String>,
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn progress_log(snapshot: &ExportSnapshot) -> String {
    let lines: String = snapshot
        .log
        .iter()
        .map(|line| format!("<div>{}</div>", escape_html(line)))
        .collect();
    format!(r#"<div class="progress-log" id="progressLog">{}</div>"#, lines)
}

fn close_form(export_id: &Uuid, tab: ReportStatus) -> String {
    format!(
        r#"<form method="post" action="/exports/{}/close">{}<button class="btn btn-secondary" type="submit">Close</button></form>"#,
        export_id,
        hidden_field("tab", tab.as_str())
    )
}

fn running_body(snapshot: &ExportSnapshot) -> String {
    format!(
        r#"<div class="card"><div class="card-header"><h5>Generating PDF...</h5><span>{state}</span></div><div class="card-body">
<p id="progressMessage">{message}</p>
{log}
</div></div>"#,
        state = escape_html(&snapshot.state),
        message = escape_html(snapshot.message.as_deref().unwrap_or("Initializing PDF generation...")),
        log = progress_log(snapshot),
    )
}

fn ready_body(snapshot: &ExportSnapshot, tab: ReportStatus) -> String {
    format!(
        r#"<div class="card"><div class="card-header"><h5>Report PDF</h5>{close}</div><div class="card-body">
<iframe class="viewer-frame" id="pdfViewer" src="/exports/{id}/document" title="Report PDF"></iframe>
</div></div>"#,
        id = snapshot.id,
        close = close_form(&snapshot.id, tab),
    )
}

fn error_body(snapshot: &ExportSnapshot, tab: ReportStatus) -> String {
    let message = snapshot
        .message
        .as_deref()
        .unwrap_or("Error during PDF generation");
    format!(
        r#"<div class="card"><div class="card-header"><h5>PDF generation failed</h5>{close}</div><div class="card-body">
{banner}
<pre class="detail">{detail}</pre>
{log}
<form method="post" action="{retry}">{tab}<button class="btn btn-primary" type="submit">Try Again</button></form>
</div></div>"#,
        close = close_form(&snapshot.id, tab),
        banner = error_banner(message),
        detail = escape_html(snapshot.detail.as_deref().unwrap_or_default()),
        log = progress_log(snapshot),
        retry = report_path(&snapshot.report_id, "export"),
        tab = hidden_field("tab", tab.as_str()),
    )
}

/// POST /reports/{id}/export
pub async fn start_export(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<TabForm>,
) -> HttpResponse {
    if let Err(redirect) = require_panel_session(&req) {
        return redirect;
    }
    let report_id = path.into_inner();
    let tab = return_tab(form.tab.as_deref());

    let job = state
        .exports
        .start(&report_id, state.store.clone(), state.generator.clone())
        .await;

    see_other(&format!("/exports/{}?tab={}", job.id, tab.as_str()))
}

/// GET /exports/{id}
pub async fn view_export(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    query: web::Query<TabForm>,
) -> HttpResponse {
    let claims = match require_panel_session(&req) {
        Ok(claims) => claims,
        Err(redirect) => return redirect,
    };
    let export_id = path.into_inner();
    let tab = return_tab(query.tab.as_deref());

    let Some(job) = state.exports.get(&export_id).await else {
        let body = format!(
            r#"{}<a class="btn btn-secondary" href="{}">Back to reports</a>"#,
            error_banner("This export has been closed or has expired."),
            list_url(tab)
        );
        return html(
            StatusCode::NOT_FOUND,
            page("Export not found", Some(&claims.email), &body, None),
        );
    };

    let snapshot = job.snapshot();
    let (title, body, refresh) = match snapshot.state.as_str() {
        "ready" => ("Report PDF", ready_body(&snapshot, tab), None),
        "error" => ("PDF generation failed", error_body(&snapshot, tab), None),
        _ => ("Generating PDF", running_body(&snapshot), Some(1)),
    };

    html(
        StatusCode::OK,
        page(title, Some(&claims.email), &body, refresh),
    )
}

/// GET /exports/{id}/document
pub async fn export_document(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    if let Err(redirect) = require_panel_session(&req) {
        return redirect;
    }
    let export_id = path.into_inner();

    let document = match state.exports.get(&export_id).await {
        Some(job) => job.with_document(|doc| (doc.filename().to_string(), doc.pdf())),
        None => None,
    };

    match document {
        Some((filename, pdf)) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ))
            .body(pdf),
        None => HttpResponse::NotFound()
            .json(ErrorResponse::not_found("No document is open for this export")),
    }
}

/// POST /exports/{id}/close
pub async fn close_export(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    form: web::Form<TabForm>,
) -> HttpResponse {
    if let Err(redirect) = require_panel_session(&req) {
        return redirect;
    }
    let export_id = path.into_inner();

    if state.exports.close(&export_id).await {
        log::info!("Viewer of export {} closed", export_id);
    }
    see_other(&list_url(return_tab(form.tab.as_deref())))
}

/// Progress of one export
#[utoipa::path(
    get,
    path = "/exports/{id}/status",
    tag = "PDF Export",
    params(("id" = String, Path, description = "Export id")),
    responses(
        (status = 200, description = "Current export state and progress log", body = ExportSnapshot),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "Export closed or expired", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    if let Err(e) = validate_request_token(&req) {
        return e.error_response();
    }

    match state.exports.get(&path.into_inner()).await {
        Some(job) => HttpResponse::Ok().json(job.snapshot()),
        None => HttpResponse::NotFound().json(ErrorResponse::not_found("Export not found")),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/reports/{id}/export",
        web::post().to(start_export),
    )
    .route("/exports/{id}", web::get().to(view_export))
    .route("/exports/{id}/document", web::get().to(export_document))
    .route("/exports/{id}/close", web::post().to(close_export))
    .route("/exports/{id}/status", web::get().to(export_status));
}
