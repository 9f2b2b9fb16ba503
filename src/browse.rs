//! Folder tree of the document root, for browsing.
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::catalog::DocType;

/// Folder levels shown below the root.
pub const MAX_DEPTH: usize = 4;

#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("document root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    pub name: String,
    pub path: PathBuf,
    pub doc_type: DocType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FolderNode {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<FileNode>,
    pub folders: Vec<FolderNode>,
}

impl FolderNode {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.folders.is_empty()
    }

    /// Supported documents in this folder and below.
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.files.len()
            + self
                .folders
                .iter()
                .map(FolderNode::document_count)
                .sum::<usize>()
    }
}

/// Read the tree under `root`, at most `max_depth` folder levels deep.
///
/// Dot-entries are skipped and siblings are sorted by name.
pub fn browse(root: &Path, max_depth: usize) -> Result<FolderNode, BrowseError> {
    if !root.is_dir() {
        return Err(BrowseError::RootNotFound(root.to_path_buf()));
    }
    read_folder(root, 0, max_depth)
}

fn read_folder(dir: &Path, depth: usize, max_depth: usize) -> Result<FolderNode, BrowseError> {
    let io_err = |source| BrowseError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut children: Vec<(String, PathBuf)> = fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(Result::ok)
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .filter(|(name, _)| !name.starts_with('.'))
        .collect();
    children.sort();

    let mut node = FolderNode {
        name: dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: dir.to_path_buf(),
        files: Vec::new(),
        folders: Vec::new(),
    };

    for (name, path) in children {
        if path.is_dir() {
            if depth < max_depth {
                node.folders.push(read_folder(&path, depth + 1, max_depth)?);
            }
        } else if let Some(doc_type) = DocType::from_path(&path) {
            node.files.push(FileNode {
                name,
                path,
                doc_type,
            });
        }
    }

    Ok(node)
}

/// Indented plain-text listing. The root itself is not printed.
pub fn render_tree(root: &FolderNode) -> String {
    let mut out = String::new();
    if root.is_empty() {
        out.push_str("(knowledge base is empty)\n");
        return out;
    }
    render_children(root, 0, &mut out);
    out
}

fn render_children(node: &FolderNode, level: usize, out: &mut String) {
    let indent = "  ".repeat(level);
    for file in &node.files {
        let _ = writeln!(out, "{indent}- [{}] {}", file.doc_type, file.name);
    }
    for folder in &node.folders {
        let _ = writeln!(out, "{indent}+ {}/", folder.name);
        if folder.is_empty() {
            let _ = writeln!(out, "{indent}    (empty folder)");
        } else {
            render_children(folder, level + 1, out);
        }
    }
}
