//! Document generation - turns a report into a PDF through a Typst template.
//!
//! - `sheet` - the fixed set of fields laid out on the page
//! - `report_pdf` - the generator filling the technical visit template
//! - `engine` - Typst CLI invocation in a scratch directory

pub mod common;
pub mod engine;
pub mod report_pdf;
pub mod sheet;
pub mod traits;

pub use engine::TypstRenderEngine;
pub use report_pdf::ReportPdfGenerator;
pub use sheet::ReportSheet;
pub use traits::Generator;

use std::sync::Arc;
use thiserror::Error;

use crate::report::Report;

/// The report generator as held by the application state.
pub type SharedGenerator = Arc<dyn Generator<Report> + Send + Sync>;

/// Errors that can occur during document generation.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to load Typst template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),
    #[error("failed to write Typst source: {0}")]
    WriteTypst(#[source] std::io::Error),
    #[error("Typst CLI execution failed: {0}")]
    TypstIo(#[source] std::io::Error),
    #[error("Typst CLI exited with status {code}: {stderr}")]
    TypstExit { code: i32, stderr: String },
    #[error("failed to read generated PDF: {0}")]
    ReadPdf(#[source] std::io::Error),
    #[error("document generation task failed: {0}")]
    Task(String),
}

/// Result of a successful document generation.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub pdf: Vec<u8>,
}
