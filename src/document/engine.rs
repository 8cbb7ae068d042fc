//! Typst rendering engine.
//!
//! Writes Typst source to a scratch directory, invokes the compiler and reads
//! back the PDF.

use std::fs;
use std::process::Command;
use tempfile::{tempdir, TempDir};

use super::GeneratorError;

const OUTPUT_FILE: &str = "output.pdf";

/// Stateless engine for rendering Typst sources to PDF bytes.
pub struct TypstRenderEngine;

impl TypstRenderEngine {
    /// Compile `typst_source` and return the PDF bytes.
    ///
    /// `source_filename` names the source inside the scratch directory and
    /// shows up in compiler diagnostics.
    pub fn render(source_filename: &str, typst_source: &str) -> Result<Vec<u8>, GeneratorError> {
        let temp_dir = tempdir().map_err(GeneratorError::TempDir)?;
        let typ_path = temp_dir.path().join(source_filename);

        fs::write(&typ_path, typst_source).map_err(GeneratorError::WriteTypst)?;

        compile_typst_to_pdf(&temp_dir, source_filename)
    }
}

fn compile_typst_to_pdf(temp_dir: &TempDir, typ_filename: &str) -> Result<Vec<u8>, GeneratorError> {
    let typ_path = temp_dir.path().join(typ_filename);
    let output_path = temp_dir.path().join(OUTPUT_FILE);

    let output = Command::new("typst")
        .arg("compile")
        .arg(&typ_path)
        .arg(&output_path)
        .current_dir(temp_dir.path())
        .output()
        .map_err(GeneratorError::TypstIo)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::error!("Typst compilation of {} failed: {}", typ_filename, stderr);
        return Err(GeneratorError::TypstExit {
            code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    fs::read(&output_path).map_err(GeneratorError::ReadPdf)
}
