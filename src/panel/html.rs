//! HTML fragments shared by the panel pages.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use v_htmlescape::escape;

use crate::report::ReportStatus;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 0; background: #f5f6f8; color: #212529; }
header { background: #fff; border-bottom: 1px solid #dee2e6; padding: 12px 24px; display: flex; justify-content: space-between; align-items: center; }
main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
.nav-tabs { display: flex; gap: 4px; border-bottom: 1px solid #dee2e6; margin-bottom: 16px; padding: 0; list-style: none; }
.nav-link { display: block; padding: 8px 16px; text-decoration: none; color: #0d6efd; border: 1px solid transparent; border-radius: 4px 4px 0 0; }
.nav-link.active { color: #495057; background: #fff; border-color: #dee2e6 #dee2e6 #fff; }
.card { background: #fff; border: 1px solid #dee2e6; border-radius: 6px; margin-bottom: 16px; }
.card-header { padding: 12px 16px; border-bottom: 1px solid #dee2e6; display: flex; justify-content: space-between; align-items: center; }
.card-body { padding: 12px 16px; }
.card-actions { display: flex; justify-content: flex-end; gap: 8px; }
.card-actions form { margin: 0; }
.status-badge { color: #fff; padding: 4px 8px; border-radius: 4px; font-size: 12px; }
.bg-primary { background: #0d6efd; } .bg-info { background: #0dcaf0; } .bg-success { background: #198754; }
.btn { padding: 6px 12px; border-radius: 4px; border: 1px solid; background: #fff; cursor: pointer; text-decoration: none; font-size: 14px; }
.btn-danger { color: #dc3545; border-color: #dc3545; } .btn-primary { color: #0d6efd; border-color: #0d6efd; }
.btn-info { color: #0aa2c0; border-color: #0dcaf0; } .btn-success { color: #198754; border-color: #198754; }
.btn-secondary { color: #6c757d; border-color: #6c757d; }
.alert { padding: 12px 16px; border-radius: 4px; margin-bottom: 16px; }
.alert-danger { background: #f8d7da; color: #842029; }
.placeholder { text-align: center; padding: 48px 0; color: #6c757d; }
.placeholder .display { font-size: 28px; }
.progress-log { text-align: left; background: #f8f9fa; padding: 10px; border-radius: 5px; max-height: 240px; overflow-y: auto; font-family: monospace; font-size: 12px; }
.viewer-frame { width: 100%; height: 80vh; border: 1px solid #dee2e6; background: #fff; }
pre.detail { white-space: pre-wrap; margin: 0; }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(value: &str) -> String {
    escape(value).to_string()
}

/// Bytes that cannot stay raw inside one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// `/reports/{id}/{action}` with the id percent-encoded, ready for an
/// `href` or `action` attribute.
pub fn report_path(report_id: &str, action: &str) -> String {
    let segment = utf8_percent_encode(report_id, PATH_SEGMENT).to_string();
    format!("/reports/{}/{}", escape_html(&segment), action)
}

/// A complete document. `refresh_secs` makes the browser reload the page.
pub fn page(title: &str, signed_in_as: Option<&str>, body: &str, refresh_secs: Option<u32>) -> String {
    let refresh = refresh_secs
        .map(|secs| format!(r#"<meta http-equiv="refresh" content="{}">"#, secs))
        .unwrap_or_default();
    let account = signed_in_as
        .map(|email| {
            format!(
                r#"<form method="post" action="/logout"><span>{}</span> <button class="btn btn-secondary" type="submit">Sign out</button></form>"#,
                escape_html(email)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Kony Admin</title>
{refresh}
<style>{STYLE}</style>
</head>
<body>
<header><strong>Kony Admin</strong>{account}</header>
<main>
{body}
</main>
</body>
</html>"#,
        title = escape_html(title),
    )
}

pub fn tab_bar(active: ReportStatus) -> String {
    let tabs: String = ReportStatus::ALL
        .iter()
        .map(|status| {
            let class = if *status == active { "nav-link active" } else { "nav-link" };
            format!(
                r#"<li><a class="{}" data-status="{}" href="/reports?status={}">{}</a></li>"#,
                class,
                status.as_str(),
                status.as_str(),
                status.label()
            )
        })
        .collect();
    format!(r#"<ul class="nav-tabs" id="reportTabs">{}</ul>"#, tabs)
}

pub fn error_banner(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger" role="alert">{}</div>"#,
        escape_html(message)
    )
}

pub fn empty_placeholder(status: ReportStatus) -> String {
    format!(
        r#"<div class="placeholder"><div class="display">No {} reports</div><p>Reports will appear here when technicians submit them</p></div>"#,
        status.as_str()
    )
}

pub fn hidden_field(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{}" value="{}">"#,
        escape_html(name),
        escape_html(value)
    )
}

pub fn login_form(error: Option<&str>, email: &str) -> String {
    let banner = error.map(error_banner).unwrap_or_default();
    format!(
        r#"<div class="card"><div class="card-header"><h5>Sign in</h5></div><div class="card-body">
{banner}
<form method="post" action="/login">
<p><label>Email <input type="email" name="email" value="{email}" required></label></p>
<p><label>Password <input type="password" name="password" required></label></p>
<button class="btn btn-primary" type="submit">Sign in</button>
</form></div></div>"#,
        email = escape_html(email),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#x27;Jerry&#x27;&lt;&#x2f;b&gt;"
        );
    }

    #[test]
    fn test_report_path_encodes_id() {
        assert_eq!(report_path("rep-42", "export"), "/reports/rep-42/export");
        assert_eq!(report_path("a#b", "status"), "/reports/a%23b/status");
        assert_eq!(report_path("a?x=1", "delete"), "/reports/a%3Fx=1/delete");
        assert_eq!(report_path("a/b%c", "export"), "/reports/a%2Fb%25c/export");
        assert_eq!(report_path("Tom & Jerry", "export"), "/reports/Tom%20&amp;%20Jerry/export");
    }

    #[test]
    fn test_tab_bar_marks_active_tab() {
        let html = tab_bar(ReportStatus::Reviewed);
        assert!(html.contains(r#"<a class="nav-link active" data-status="reviewed""#));
        assert!(html.contains(r#"<a class="nav-link" data-status="submitted""#));
    }

    #[test]
    fn test_placeholder_names_status() {
        assert!(empty_placeholder(ReportStatus::Submitted).contains("No submitted reports"));
    }
}
