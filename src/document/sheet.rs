use crate::report::Report;

use super::common::format_document_date;

pub const SHEET_TITLE: &str = "RAPPORT DE VISITE TECHNIQUE";
const MISSING: &str = "N/A";

/// The text laid out on the exported page. Floor data never reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSheet {
    pub title: &'static str,
    pub lines: Vec<SheetLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLine {
    pub label: &'static str,
    pub value: String,
}

impl ReportSheet {
    pub fn from_report(report: &Report) -> Self {
        let or_missing = |value: Option<&str>| match value {
            Some(v) if !v.trim().is_empty() => v.to_string(),
            _ => MISSING.to_string(),
        };

        let lines = vec![
            SheetLine {
                label: "Client",
                value: or_missing(report.client_name.as_deref()),
            },
            SheetLine {
                label: "Location",
                value: or_missing(report.location.as_deref()),
            },
            SheetLine {
                label: "Date",
                value: report
                    .date
                    .as_ref()
                    .map(format_document_date)
                    .unwrap_or_else(|| MISSING.to_string()),
            },
            SheetLine {
                label: "Report ID",
                value: report.id.clone(),
            },
            SheetLine {
                label: "Status",
                value: report.status.to_string(),
            },
        ];

        Self {
            title: SHEET_TITLE,
            lines,
        }
    }

    pub fn value_of(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.value.as_str())
    }
}
