/// Bounded text extraction from office documents.
///
/// Only a prefix of each document is read (first page, first paragraphs,
/// first rows, first slides) to keep a full scan fast.
pub mod docx;
pub mod mock;
pub mod pdf;
pub mod pptx;
pub mod xlsx;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DocType;

/// Errors that can occur while reading a document excerpt.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported document: {0}")]
    Unsupported(String),

    #[error("pdf error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("docx error: {0}")]
    Docx(String),

    #[error("xlsx error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("xml error: {0}")]
    Xml(#[from] xml::reader::Error),
}

fn default_pdf_pages() -> usize {
    1
}

fn default_doc_paragraphs() -> usize {
    20
}

fn default_sheet_rows() -> usize {
    5
}

fn default_slides() -> usize {
    3
}

/// How much of each document type is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcerptLimits {
    #[serde(default = "default_pdf_pages")]
    pub pdf_pages: usize,

    #[serde(default = "default_doc_paragraphs")]
    pub doc_paragraphs: usize,

    /// Rows per sheet, counted from the top of the sheet.
    #[serde(default = "default_sheet_rows")]
    pub sheet_rows: usize,

    #[serde(default = "default_slides")]
    pub slides: usize,
}

impl Default for ExcerptLimits {
    fn default() -> Self {
        Self {
            pdf_pages: default_pdf_pages(),
            doc_paragraphs: default_doc_paragraphs(),
            sheet_rows: default_sheet_rows(),
            slides: default_slides(),
        }
    }
}

/// Trait for excerpt extraction.
///
/// Implementations must be `Send + Sync` so a builder can be shared
/// with a blocking task.
pub trait ContentExtractor: Send + Sync {
    fn extract(&self, path: &Path, doc_type: DocType) -> Result<String, ExtractError>;

    /// Total form of [`extract`](Self::extract): failures become an empty excerpt.
    fn extract_or_empty(&self, path: &Path, doc_type: DocType) -> String {
        match self.extract(path, doc_type) {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!("No excerpt for {}: {e}", path.display());
                String::new()
            }
        }
    }
}

/// Reads PDF, Word, Excel and PowerPoint files.
#[derive(Debug, Clone, Default)]
pub struct OfficeExtractor {
    limits: ExcerptLimits,
}

impl OfficeExtractor {
    pub fn new(limits: ExcerptLimits) -> Self {
        Self { limits }
    }
}

impl ContentExtractor for OfficeExtractor {
    fn extract(&self, path: &Path, doc_type: DocType) -> Result<String, ExtractError> {
        match doc_type {
            DocType::Pdf => pdf::extract(path, self.limits.pdf_pages),
            DocType::Docx | DocType::Doc => docx::extract(path, self.limits.doc_paragraphs),
            DocType::Xlsx => xlsx::extract(path, self.limits.sheet_rows),
            DocType::Pptx => pptx::extract(path, self.limits.slides),
        }
    }
}
