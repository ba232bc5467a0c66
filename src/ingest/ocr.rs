//! External OCR and PDF rasterization tools

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::config::settings::{OcrSettings, RasterizerSettings};
use crate::error::{ReceiptError, ReceiptResult};

/// Turns one page image into text
pub trait OcrEngine {
    fn transcribe(&self, image: &Path) -> ReceiptResult<String>;
}

/// Renders a PDF into page images
pub trait Rasterizer {
    /// Page images in page order
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> ReceiptResult<Vec<PathBuf>>;
}

fn run(command: &mut Command, what: &str) -> ReceiptResult<Vec<u8>> {
    let output = command
        .output()
        .map_err(|e| ReceiptError::Ocr(format!("Failed to start {}: {}", what, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ReceiptError::Ocr(format!(
            "{} exited with {}: {}",
            what,
            output.status,
            stderr.trim()
        )));
    }
    Ok(output.stdout)
}

/// Tesseract invoked as `<bin> <image> stdout --psm <mode> [-l <lang>]`
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    settings: OcrSettings,
}

impl TesseractEngine {
    pub fn new(settings: OcrSettings) -> Self {
        Self { settings }
    }

    pub fn command(&self, image: &Path) -> Command {
        let mut command = Command::new(&self.settings.engine_binary_path);
        command
            .arg(image)
            .arg("stdout")
            .arg("--psm")
            .arg(self.settings.page_segmentation_mode.to_string());
        if let Some(language) = &self.settings.language {
            command.arg("-l").arg(language);
        }
        command
    }
}

impl OcrEngine for TesseractEngine {
    fn transcribe(&self, image: &Path) -> ReceiptResult<String> {
        debug!(image = %image.display(), "running ocr");
        let stdout = run(&mut self.command(image), "tesseract")?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Poppler's `pdftoppm`, writing `<prefix>-<n>.png` per page
#[derive(Debug, Clone)]
pub struct PdfToPpm {
    settings: RasterizerSettings,
}

impl PdfToPpm {
    pub fn new(settings: RasterizerSettings) -> Self {
        Self { settings }
    }
}

/// Page number of `<prefix>-<n>.png`
fn page_number(path: &Path, prefix: &str) -> Option<u32> {
    path.file_stem()?
        .to_str()?
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Page images for `prefix` in `dir`, ordered by page number
///
/// pdftoppm zero-pads page numbers only as wide as the page count, so a
/// name sort would be wrong for documents with ten or more pages.
pub fn collect_pages(dir: &Path, prefix: &str) -> ReceiptResult<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .map_err(|e| ReceiptError::Ocr(format!("Failed to read {}: {}", dir.display(), e)))?;

    let mut pages: Vec<(u32, PathBuf)> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|e| e == "png").unwrap_or(false))
        .filter_map(|path| page_number(&path, prefix).map(|n| (n, path)))
        .collect();

    pages.sort_by_key(|(n, _)| *n);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

impl Rasterizer for PdfToPpm {
    fn rasterize(&self, pdf: &Path, out_dir: &Path) -> ReceiptResult<Vec<PathBuf>> {
        fs::create_dir_all(out_dir)
            .map_err(|e| ReceiptError::Io(format!("Failed to create {}: {}", out_dir.display(), e)))?;

        let prefix = pdf
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "page".to_string());

        let mut command = Command::new(&self.settings.binary_path);
        command
            .arg("-png")
            .arg("-r")
            .arg(self.settings.dpi.to_string())
            .arg(pdf)
            .arg(out_dir.join(&prefix));
        run(&mut command, "pdftoppm")?;

        let pages = collect_pages(out_dir, &prefix)?;
        if pages.is_empty() {
            return Err(ReceiptError::Ocr(format!(
                "pdftoppm produced no pages for {}",
                pdf.display()
            )));
        }
        debug!(pdf = %pdf.display(), pages = pages.len(), "rasterized");
        Ok(pages)
    }
}
