//! Generator for the technical visit report PDF.

use std::fs;

use super::common::{escape_typst_string, get_static_dir, sanitize_filename};
use super::engine::TypstRenderEngine;
use super::sheet::ReportSheet;
use super::traits::Generator;
use super::{GeneratedDocument, GeneratorError};
use crate::report::Report;

const TEMPLATE_FILE: &str = "technical_visit_report.typ";

pub struct ReportPdfGenerator {
    template: String,
}

impl ReportPdfGenerator {
    /// Load the template from the static directory.
    pub fn new() -> Result<Self, GeneratorError> {
        let template_path = get_static_dir().join(TEMPLATE_FILE);
        let template = fs::read_to_string(&template_path).map_err(GeneratorError::TemplateIo)?;
        Ok(Self { template })
    }

    /// Complete Typst source: the template followed by a call filled from the sheet.
    pub fn render_source(&self, sheet: &ReportSheet) -> String {
        let lines: String = sheet
            .lines
            .iter()
            .map(|line| {
                format!(
                    "    (\"{}\", \"{}\"),\n",
                    escape_typst_string(line.label),
                    escape_typst_string(&line.value)
                )
            })
            .collect();

        format!(
            "{}\n#rapport_visite(\n  title: \"{}\",\n  lines: (\n{}  ),\n)\n",
            self.template.trim_end(),
            escape_typst_string(sheet.title),
            lines
        )
    }

    pub fn output_filename(report: &Report) -> String {
        format!(
            "rapport-{}-{}.pdf",
            sanitize_filename(report.display_name(), "client"),
            sanitize_filename(&report.id, "report")
        )
    }
}

impl Generator<Report> for ReportPdfGenerator {
    fn generate(&self, report: &Report) -> Result<GeneratedDocument, GeneratorError> {
        let sheet = ReportSheet::from_report(report);
        let source = self.render_source(&sheet);
        log::debug!("Compiling report {} ({} bytes of Typst)", report.id, source.len());

        let pdf = TypstRenderEngine::render(TEMPLATE_FILE, &source)?;

        Ok(GeneratedDocument {
            filename: Self::output_filename(report),
            pdf,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{Floor, ReportStatus};
    use chrono::{TimeZone, Utc};

    fn sample_report() -> Report {
        Report {
            id: "rep-42".to_string(),
            client_name: Some("Lycée \"Ampère\"".to_string()),
            location: Some("Lyon".to_string()),
            date: Some(Utc.with_ymd_and_hms(2025, 5, 20, 8, 0, 0).unwrap()),
            technician_name: Some("Nadia".to_string()),
            project_manager: None,
            status: ReportStatus::Reviewed,
            submitted_at: None,
            floors: vec![Floor {
                name: "Étage secret".to_string(),
                ..Floor::default()
            }],
        }
    }

    #[test]
    fn test_new_generator() {
        let result = ReportPdfGenerator::new();
        assert!(result.is_ok());
    }

    #[test]
    fn test_source_carries_sheet_values_only() {
        let generator = ReportPdfGenerator::new().unwrap();
        let report = sample_report();
        let source = generator.render_source(&ReportSheet::from_report(&report));

        assert!(source.contains(r#"("Client", "Lycée \"Ampère\"")"#));
        assert!(source.contains(r#"("Location", "Lyon")"#));
        assert!(source.contains(r#"("Date", "20/05/2025")"#));
        assert!(source.contains(r#"("Report ID", "rep-42")"#));
        assert!(source.contains(r#"("Status", "reviewed")"#));
        assert!(source.contains("#rapport_visite("));
        assert!(!source.contains("Étage secret"));
        assert!(!source.contains("Nadia"));
    }

    #[test]
    fn test_output_filename() {
        let report = sample_report();
        assert_eq!(
            ReportPdfGenerator::output_filename(&report),
            "rapport-lyce-ampre-rep-42.pdf"
        );
    }
}
