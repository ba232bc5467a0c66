//! Getting receipts from the remote store to text
//!
//! Each step sits behind a trait so a run can be driven by real tools
//! (a watched folder, tesseract, pdftoppm) or by test doubles.

pub mod download;
pub mod ocr;
pub mod remote;
pub mod stage;
pub mod transcribe;

pub use download::download;
pub use ocr::{OcrEngine, PdfToPpm, Rasterizer, TesseractEngine};
pub use remote::{Chunk, DirectoryRemote, FolderFilter, RemoteStore};
pub use stage::LocalStage;
pub use transcribe::{DocumentTranscriber, Transcriber};
