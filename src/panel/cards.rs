//! Report cards. Each card carries its actions already bound to the
//! endpoint that performs them.

use chrono::{DateTime, Utc};

use super::html::{escape_html, hidden_field, report_path};
use crate::report::{Report, ReportStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Delete,
    ViewPdf,
    MarkReviewed,
    Approve,
}

#[derive(Debug, Clone)]
pub struct CardAction {
    pub kind: ActionKind,
    pub label: &'static str,
    /// `get` actions render as links, `post` actions as forms.
    pub method: &'static str,
    /// Already HTML-safe: the report id is percent-encoded and escaped when the card is built.
    pub target: String,
    pub fields: Vec<(&'static str, String)>,
    pub style: &'static str,
}

#[derive(Debug, Clone)]
pub struct ReportCard {
    pub report_id: String,
    pub title: String,
    pub status: ReportStatus,
    pub details: Vec<(&'static str, String)>,
    pub actions: Vec<CardAction>,
}

pub fn badge_class(status: ReportStatus) -> &'static str {
    match status {
        ReportStatus::Submitted => "bg-primary",
        ReportStatus::Reviewed => "bg-info",
        ReportStatus::Approved => "bg-success",
    }
}

/// Short month form used on cards, e.g. "Mar 5, 2025".
pub fn format_card_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn or_not_specified(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "Not specified".to_string(),
    }
}

impl ReportCard {
    /// Build the card of `report` as listed under the `tab` tab.
    pub fn build(report: &Report, tab: ReportStatus) -> Self {
        let mut details = vec![
            ("Location", or_not_specified(report.location.as_deref())),
            ("Technician", or_not_specified(report.technician_name.as_deref())),
            ("Project Manager", or_not_specified(report.project_manager.as_deref())),
            (
                "Date",
                report
                    .date
                    .as_ref()
                    .map(format_card_date)
                    .unwrap_or_else(|| "Not specified".to_string()),
            ),
        ];
        if let Some(submitted) = &report.submitted_at {
            details.push(("Submitted", format_card_date(submitted)));
        }

        Self {
            report_id: report.id.clone(),
            title: report.display_name().to_string(),
            status: report.status,
            details,
            actions: Self::actions_for(report, tab),
        }
    }

    fn actions_for(report: &Report, tab: ReportStatus) -> Vec<CardAction> {
        let tab_field = ("tab", tab.as_str().to_string());

        let mut actions = vec![
            CardAction {
                kind: ActionKind::Delete,
                label: "Delete",
                method: "get",
                target: format!("{}?tab={}", report_path(&report.id, "delete"), tab.as_str()),
                fields: Vec::new(),
                style: "btn-danger",
            },
            CardAction {
                kind: ActionKind::ViewPdf,
                label: "View PDF",
                method: "post",
                target: report_path(&report.id, "export"),
                fields: vec![tab_field.clone()],
                style: "btn-primary",
            },
        ];

        match report.status.next() {
            Some(ReportStatus::Reviewed) => actions.push(CardAction {
                kind: ActionKind::MarkReviewed,
                label: "Mark as Reviewed",
                method: "post",
                target: report_path(&report.id, "status"),
                fields: vec![("status", "reviewed".to_string()), tab_field],
                style: "btn-info",
            }),
            Some(ReportStatus::Approved) => actions.push(CardAction {
                kind: ActionKind::Approve,
                label: "Approve",
                method: "post",
                target: report_path(&report.id, "status"),
                fields: vec![("status", "approved".to_string()), tab_field],
                style: "btn-success",
            }),
            _ => {}
        }

        actions
    }

    pub fn has_action(&self, kind: ActionKind) -> bool {
        self.actions.iter().any(|a| a.kind == kind)
    }

    pub fn render(&self) -> String {
        let details: String = self
            .details
            .iter()
            .map(|(label, value)| format!("<p><strong>{}:</strong> {}</p>", label, escape_html(value)))
            .collect();
        let actions: String = self.actions.iter().map(CardAction::render).collect();

        format!(
            r#"<div class="card" id="report-{id}">
<div class="card-header"><h5>{title}</h5><span class="status-badge {badge}">{status}</span></div>
<div class="card-body">{details}<div class="card-actions">{actions}</div></div>
</div>"#,
            id = escape_html(&self.report_id),
            title = escape_html(&self.title),
            badge = badge_class(self.status),
            status = self.status.as_str().to_uppercase(),
        )
    }
}

impl CardAction {
    pub fn render(&self) -> String {
        if self.method == "get" {
            return format!(
                r#"<a class="btn {}" href="{}">{}</a>"#,
                self.style,
                self.target,
                self.label
            );
        }

        let fields: String = self
            .fields
            .iter()
            .map(|(name, value)| hidden_field(name, value))
            .collect();
        format!(
            r#"<form method="post" action="{}">{}<button class="btn {}" type="submit">{}</button></form>"#,
            self.target,
            fields,
            self.style,
            self.label
        )
    }
}
