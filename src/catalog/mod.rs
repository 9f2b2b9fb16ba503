//! Catalog data model: one entry per indexed office document.
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod cache;

/// Document formats accepted at scan time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Pdf,
    Docx,
    Doc,
    Xlsx,
    Pptx,
}

impl DocType {
    pub const ALL: [DocType; 5] = [
        DocType::Pdf,
        DocType::Docx,
        DocType::Doc,
        DocType::Xlsx,
        DocType::Pptx,
    ];

    /// Match an extension (without the dot), ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            DocType::Pdf => "pdf",
            DocType::Docx => "docx",
            DocType::Doc => "doc",
            DocType::Xlsx => "xlsx",
            DocType::Pptx => "pptx",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// File name including extension.
    pub name: String,
    /// Absolute location; unique within a catalog.
    pub path: PathBuf,
    pub doc_type: DocType,
    pub department: String,
    pub year: String,
    /// Breadcrumb of directory names from the root down to the file.
    pub category_path: String,
    /// Bounded text prefix, empty when extraction failed.
    pub content_excerpt: String,
}

/// Whether the catalog root is usable, as seen at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootState {
    Missing,
    Empty,
    Populated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub root: PathBuf,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(root: impl Into<PathBuf>, entries: Vec<CatalogEntry>) -> Self {
        Self {
            root: root.into(),
            built_at: Utc::now(),
            entries,
        }
    }

    /// An empty catalog for a root that could not be scanned.
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self::new(root, Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    #[must_use]
    pub fn root_state(&self) -> RootState {
        if !self.root.is_dir() {
            RootState::Missing
        } else if self.entries.is_empty() {
            RootState::Empty
        } else {
            RootState::Populated
        }
    }
}
