//! Raw document to text

use tracing::debug;

use super::ocr::{OcrEngine, Rasterizer};
use super::stage::LocalStage;
use crate::error::{ReceiptError, ReceiptResult};
use crate::models::RawDocument;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Produces the OCR text of a downloaded receipt
pub trait Transcriber {
    fn transcribe(&self, document: &RawDocument) -> ReceiptResult<String>;
}

/// Transcribes by file type: PDFs are rasterized and every page OCR'd,
/// images are OCR'd directly, text files pass through unchanged
///
/// Raw bytes are staged only for as long as the external tools need them.
pub struct DocumentTranscriber<'a> {
    stage: &'a LocalStage,
    ocr: &'a dyn OcrEngine,
    rasterizer: &'a dyn Rasterizer,
}

impl<'a> DocumentTranscriber<'a> {
    pub fn new(
        stage: &'a LocalStage,
        ocr: &'a dyn OcrEngine,
        rasterizer: &'a dyn Rasterizer,
    ) -> Self {
        Self {
            stage,
            ocr,
            rasterizer,
        }
    }

    fn transcribe_pdf(&self, document: &RawDocument) -> ReceiptResult<String> {
        let pdf = self.stage.write_bytes(&document.name, &document.bytes)?;
        let pages_dir = tempfile::Builder::new()
            .prefix("pages-")
            .tempdir_in(self.stage.dir())
            .map_err(|e| ReceiptError::Io(format!("Failed to create page directory: {}", e)))?;

        let result = self
            .rasterizer
            .rasterize(&pdf, pages_dir.path())
            .and_then(|pages| {
                pages
                    .iter()
                    .map(|page| self.ocr.transcribe(page))
                    .collect::<ReceiptResult<Vec<_>>>()
            })
            .map(|texts| texts.join("\n"));

        self.stage.remove(&document.name)?;
        result
    }

    fn transcribe_image(&self, document: &RawDocument) -> ReceiptResult<String> {
        let image = self.stage.write_bytes(&document.name, &document.bytes)?;
        let result = self.ocr.transcribe(&image);
        self.stage.remove(&document.name)?;
        result
    }
}

impl Transcriber for DocumentTranscriber<'_> {
    fn transcribe(&self, document: &RawDocument) -> ReceiptResult<String> {
        let extension = document.extension().unwrap_or_default();
        debug!(name = %document.name, kind = %extension, "transcribing");

        match extension.as_str() {
            "pdf" => self.transcribe_pdf(document),
            "txt" => Ok(String::from_utf8_lossy(&document.bytes).into_owned()),
            ext if IMAGE_EXTENSIONS.contains(&ext) => self.transcribe_image(document),
            _ => Err(ReceiptError::Ocr(format!(
                "Unsupported document type: {}",
                document.name
            ))),
        }
    }
}
