use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use super::cards::ReportCard;
use super::html::{
    empty_placeholder, error_banner, escape_html, hidden_field, page, report_path, tab_bar,
};
use super::PanelError;
use crate::auth::require_panel_session;
use crate::report::{advance_status as advance_report_status, ReportStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TabQuery {
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    pub tab: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    pub confirm: Option<String>,
    pub tab: Option<String>,
}

pub(crate) fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}

pub(crate) fn list_url(tab: ReportStatus) -> String {
    format!("/reports?status={}", tab.as_str())
}

/// Tab to return to after an action. Anything unreadable goes back to the first tab.
pub(crate) fn return_tab(raw: Option<&str>) -> ReportStatus {
    raw.and_then(|t| t.parse().ok())
        .unwrap_or(ReportStatus::Submitted)
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Render one tab from a fresh store read. `notice` is the banner of a
/// failed action, shown above the list.
async fn render_list(
    state: &AppState,
    tab: ReportStatus,
    signed_in_as: &str,
    notice: Option<String>,
    status: StatusCode,
) -> HttpResponse {
    let listing: String = match state.store.list_by_status(tab).await {
        Ok(reports) if reports.is_empty() => empty_placeholder(tab),
        Ok(reports) => reports
            .iter()
            .map(|report| ReportCard::build(report, tab).render())
            .collect(),
        Err(e) => {
            log::error!("Failed to load {} reports: {}", tab, e);
            error_banner(&format!("Error loading reports: {}", e))
        }
    };

    let body = format!(
        r#"<h2>Technical Visit Reports</h2>
{tabs}
<div id="reportsList">{notice}{listing}</div>"#,
        tabs = tab_bar(tab),
        notice = notice.as_deref().map(error_banner).unwrap_or_default(),
    );
    html(status, page(tab.label(), Some(signed_in_as), &body, None))
}

pub async fn index() -> HttpResponse {
    see_other("/reports")
}

pub async fn list_reports(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> HttpResponse {
    let claims = match require_panel_session(&req) {
        Ok(claims) => claims,
        Err(redirect) => return redirect,
    };

    let tab = match query.status.as_deref() {
        None => ReportStatus::Submitted,
        Some(raw) => match raw.parse::<ReportStatus>() {
            Ok(tab) => tab,
            Err(e) => {
                let err = PanelError::from(e);
                return render_list(
                    &state,
                    ReportStatus::Submitted,
                    &claims.email,
                    Some(err.to_string()),
                    err.status_code(),
                )
                .await;
            }
        },
    };

    render_list(&state, tab, &claims.email, None, StatusCode::OK).await
}

pub async fn advance_status(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<StatusForm>,
) -> HttpResponse {
    let claims = match require_panel_session(&req) {
        Ok(claims) => claims,
        Err(redirect) => return redirect,
    };
    let report_id = path.into_inner();
    let tab = return_tab(form.tab.as_deref());

    let outcome = match form.status.parse::<ReportStatus>() {
        Ok(target) => advance_report_status(state.store.as_ref(), &report_id, target)
            .await
            .map_err(PanelError::from),
        Err(e) => Err(PanelError::from(e)),
    };

    match outcome {
        Ok(()) => see_other(&list_url(tab)),
        Err(err) => {
            log::error!("Status update of report {} failed: {}", report_id, err);
            render_list(
                &state,
                tab,
                &claims.email,
                Some(format!("Failed to update report status: {}", err)),
                err.status_code(),
            )
            .await
        }
    }
}

pub async fn confirm_delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<TabQuery>,
) -> HttpResponse {
    let claims = match require_panel_session(&req) {
        Ok(claims) => claims,
        Err(redirect) => return redirect,
    };
    let report_id = path.into_inner();
    let tab = return_tab(query.tab.as_deref());

    let name = match state.store.get_by_id(&report_id).await {
        Ok(report) => Some(report.display_name().to_string()),
        Err(e) if e.is_not_found() => {
            let err = PanelError::from(e);
            return render_list(
                &state,
                tab,
                &claims.email,
                Some(format!("Failed to delete report: {}", err)),
                err.status_code(),
            )
            .await;
        }
        Err(e) => {
            log::warn!("Could not load report {} for delete confirmation: {}", report_id, e);
            None
        }
    };

    let heading = name
        .map(|n| format!("Delete {}?", escape_html(&n)))
        .unwrap_or_else(|| "Delete report?".to_string());
    let body = format!(
        r#"<div class="card"><div class="card-header"><h5>{heading}</h5></div><div class="card-body">
<p>Are you sure you want to delete this report? This action cannot be undone.</p>
<div class="card-actions">
<a class="btn btn-secondary" href="{cancel}">Cancel</a>
<form method="post" action="{action}">{confirm}{tab}<button class="btn btn-danger" type="submit">Confirm</button></form>
</div></div></div>"#,
        cancel = list_url(tab),
        action = report_path(&report_id, "delete"),
        confirm = hidden_field("confirm", "yes"),
        tab = hidden_field("tab", tab.as_str()),
    );

    html(
        StatusCode::OK,
        page("Delete report", Some(&claims.email), &body, None),
    )
}

pub async fn delete_report(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    form: web::Form<DeleteForm>,
) -> HttpResponse {
    let claims = match require_panel_session(&req) {
        Ok(claims) => claims,
        Err(redirect) => return redirect,
    };
    let report_id = path.into_inner();
    let tab = return_tab(form.tab.as_deref());

    if form.confirm.as_deref() != Some("yes") {
        log::debug!("Deletion of report {} cancelled", report_id);
        return see_other(&list_url(tab));
    }

    match state.store.delete_by_id(&report_id).await {
        Ok(()) => {
            log::info!("Report {} deleted by {}", report_id, claims.email);
            see_other(&list_url(tab))
        }
        Err(e) => {
            log::error!("Failed to delete report {}: {}", report_id, e);
            let err = PanelError::from(e);
            render_list(
                &state,
                tab,
                &claims.email,
                Some(format!("Failed to delete report: {}", err)),
                err.status_code(),
            )
            .await
        }
    }
}
