//! Artifact production: the Korean summary rendered to DOCX or PDF on disk.

pub mod docx;
pub mod pdf;

use std::path::Path;

use tracing::info;

use crate::agent::plan::FileFormat;
use crate::error::ArtifactError;

pub use pdf::{PageGeometry, PdfFont, PdfRenderer};

/// Writes summary text to a file in the requested format.
///
/// Rendering is synchronous; async callers run `produce` on the blocking pool.
#[derive(Debug, Clone)]
pub struct ArtifactProducer {
    pdf: PdfRenderer,
}

impl ArtifactProducer {
    /// Build a producer, loading the PDF font from `font_path` if it exists.
    pub fn new(font_path: Option<&Path>) -> Self {
        Self {
            pdf: PdfRenderer::new(PdfFont::load_or_default(font_path)),
        }
    }

    pub fn with_font(font: PdfFont) -> Self {
        Self {
            pdf: PdfRenderer::new(font),
        }
    }

    /// Render `text` and write it to `destination`, creating parent dirs.
    /// Any format other than PDF is written as DOCX.
    pub fn produce(
        &self,
        format: FileFormat,
        text: &str,
        destination: &Path,
    ) -> Result<(), ArtifactError> {
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let format = format.renderable();
        let bytes = match format {
            FileFormat::Pdf => self.pdf.render(text)?,
            _ => docx::render_docx(text)?,
        };
        std::fs::write(destination, &bytes)?;

        info!(
            file_format = %format,
            path = %destination.display(),
            bytes = bytes.len(),
            "Artifact written"
        );
        Ok(())
    }
}
