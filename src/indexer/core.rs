use crate::catalog::{Catalog, CatalogEntry, DocType};
use crate::extractor::ContentExtractor;
use crate::indexer::tags::TagRules;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("catalog root does not exist: {0}")]
    RootNotFound(PathBuf),

    #[error("cannot resolve catalog root {path}: {source}")]
    Resolve {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub documents: usize,
    pub empty_excerpts: usize,
    pub unreadable: usize,
}

pub struct IndexBuilder<'a, E: ContentExtractor + ?Sized> {
    pub root: PathBuf,
    pub extractor: &'a E,
    pub rules: &'a TagRules,
}

impl<'a, E: ContentExtractor + ?Sized> IndexBuilder<'a, E> {
    pub fn new<P: AsRef<Path>>(root: P, extractor: &'a E, rules: &'a TagRules) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extractor,
            rules,
        }
    }

    /// Walks the root and builds one entry per supported document.
    ///
    /// Siblings are visited in file-name order so two scans of the same tree
    /// produce identical catalogs. Documents that cannot be read still get an
    /// entry with an empty excerpt.
    pub fn build(&self) -> Result<Catalog, IndexError> {
        let root = std::path::absolute(&self.root).map_err(|source| IndexError::Resolve {
            path: self.root.clone(),
            source,
        })?;
        if !root.is_dir() {
            return Err(IndexError::RootNotFound(root));
        }

        let mut stats = ScanStats::default();
        let mut entries = Vec::new();

        let walker = WalkBuilder::new(&root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", root.display());
                    stats.unreadable += 1;
                    continue;
                }
            };
            let path = entry.path();
            if entry.depth() == 0 || !path.is_file() {
                continue;
            }
            let Some(doc_type) = DocType::from_path(path) else {
                continue;
            };

            let catalog_entry = self.entry_for(&root, path, doc_type);
            if catalog_entry.content_excerpt.is_empty() {
                stats.empty_excerpts += 1;
            }
            stats.documents += 1;
            entries.push(catalog_entry);
        }

        info!(
            "Indexed {} documents under {} ({} without excerpt, {} unreadable entries)",
            stats.documents,
            root.display(),
            stats.empty_excerpts,
            stats.unreadable
        );

        Ok(Catalog::new(root, entries))
    }

    fn entry_for(&self, root: &Path, path: &Path, doc_type: DocType) -> CatalogEntry {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let segments: Vec<String> = path
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();

        CatalogEntry {
            department: self.rules.department(&segments),
            year: self.rules.year(&name),
            category_path: self.rules.category_path(&segments),
            content_excerpt: self.extractor.extract_or_empty(path, doc_type),
            path: path.to_path_buf(),
            doc_type,
            name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::OfficeExtractor;
    use crate::extractor::mock::MockExtractor;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"placeholder").unwrap();
    }

    #[test]
    fn test_builder_tags_and_order() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        touch(&root.join("卫生/公共卫生团组/2024年登革热防控方案.pdf"));
        touch(&root.join("卫生/公共卫生团组/notes.txt"));
        touch(&root.join("教育/教育管理团组/教育报告2023.docx"));
        touch(&root.join("教育/说明.DOCX"));
        touch(&root.join("总览.xlsx"));

        let extractor = MockExtractor::new().with_excerpt("2024年登革热防控方案.pdf", "伊蚊");
        let rules = TagRules::default();
        let catalog = IndexBuilder::new(root, &extractor, &rules).build().unwrap();

        let names: Vec<&str> = catalog.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "2024年登革热防控方案.pdf",
                "总览.xlsx",
                "教育报告2023.docx",
                "说明.DOCX"
            ]
        );

        let dengue = &catalog.entries[0];
        assert_eq!(dengue.department, "公共卫生团组");
        assert_eq!(dengue.year, "2024");
        assert_eq!(dengue.category_path, "卫生 > 公共卫生团组");
        assert_eq!(dengue.content_excerpt, "伊蚊");
        assert_eq!(dengue.doc_type, DocType::Pdf);
        assert!(dengue.path.is_absolute());

        let report = &catalog.entries[2];
        assert_eq!(report.year, "2023");
        assert_eq!(report.department, "教育管理团组");

        let guide = &catalog.entries[3];
        assert_eq!(guide.doc_type, DocType::Docx);
        assert_eq!(guide.department, "通用资源");
        assert_eq!(guide.year, "----");
        assert_eq!(guide.category_path, "教育");

        let overview = &catalog.entries[1];
        assert_eq!(overview.category_path, "");
    }

    #[test]
    fn test_missing_root() {
        let temp_dir = tempdir().unwrap();
        let extractor = MockExtractor::new();
        let rules = TagRules::default();
        let result = IndexBuilder::new(temp_dir.path().join("data"), &extractor, &rules).build();
        assert!(matches!(result, Err(IndexError::RootNotFound(_))));
    }

    #[test]
    fn test_empty_root() {
        let temp_dir = tempdir().unwrap();
        let extractor = MockExtractor::new();
        let rules = TagRules::default();
        let catalog = IndexBuilder::new(temp_dir.path(), &extractor, &rules)
            .build()
            .unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_malformed_documents_keep_their_entries() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        for name in ["a.pdf", "b.docx", "c.doc", "d.xlsx", "e.pptx"] {
            touch(&root.join("团组甲").join(name));
        }

        let extractor = OfficeExtractor::default();
        let rules = TagRules::default();
        let catalog = IndexBuilder::new(root, &extractor, &rules).build().unwrap();

        assert_eq!(catalog.len(), 5);
        for entry in &catalog.entries {
            assert!(entry.content_excerpt.is_empty(), "{}", entry.name);
            assert_eq!(entry.department, "团组甲");
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let temp_dir = tempdir().unwrap();
        let root = temp_dir.path();
        for rel in ["b/2022z.pdf", "a/团组/x2020.pptx", "a/b.xlsx", "c.doc"] {
            touch(&root.join(rel));
        }
        let extractor = MockExtractor::new().with_excerpt("c.doc", "content");
        let rules = TagRules::default();
        let builder = IndexBuilder::new(root, &extractor, &rules);

        let first = builder.build().unwrap();
        let second = builder.build().unwrap();
        assert_eq!(first.entries, second.entries);
    }
}
