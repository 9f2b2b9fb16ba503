/// Persistent catalog cache.
///
/// Stores the full catalog as a tagged, versioned JSON document so the next
/// start-up can skip re-extraction. Anything unexpected on load is a cache
/// miss; write failures only cost a rebuild on the next start.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{Catalog, CatalogEntry};

const CACHE_FORMAT: &str = "policykb-catalog";
pub const CACHE_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] io::Error),

    #[error("cache decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected cache format {found:?} version {version}")]
    Format { found: String, version: u32 },

    #[error("cache was built for {0}")]
    RootMismatch(PathBuf),
}

#[derive(Serialize, Deserialize)]
struct CacheFile {
    format: String,
    version: u32,
    root: PathBuf,
    built_at: DateTime<Utc>,
    entries: Vec<CatalogEntry>,
}

#[derive(Debug, Clone)]
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached catalog for `root`. Every failure is a miss.
    pub fn load(&self, root: &Path) -> Option<Catalog> {
        if !self.path.exists() {
            debug!("No catalog cache at {}", self.path.display());
            return None;
        }
        match self.try_load(root) {
            Ok(catalog) => {
                info!(
                    "Loaded {} catalog entries from {}",
                    catalog.len(),
                    self.path.display()
                );
                Some(catalog)
            }
            Err(e) => {
                warn!("Ignoring catalog cache {}: {e}", self.path.display());
                None
            }
        }
    }

    fn try_load(&self, root: &Path) -> Result<Catalog, CacheError> {
        let data = fs::read_to_string(&self.path)?;
        let file: CacheFile = serde_json::from_str(&data)?;

        if file.format != CACHE_FORMAT || file.version != CACHE_VERSION {
            return Err(CacheError::Format {
                found: file.format,
                version: file.version,
            });
        }
        if file.root != root {
            return Err(CacheError::RootMismatch(file.root));
        }

        Ok(Catalog {
            root: file.root,
            built_at: file.built_at,
            entries: file.entries,
        })
    }

    /// Persist the catalog. Returns `false` if the write failed.
    pub fn save(&self, catalog: &Catalog) -> bool {
        match self.try_save(catalog) {
            Ok(()) => {
                debug!("Saved catalog cache to {}", self.path.display());
                true
            }
            Err(e) => {
                warn!("Failed to write catalog cache {}: {e}", self.path.display());
                false
            }
        }
    }

    fn try_save(&self, catalog: &Catalog) -> Result<(), CacheError> {
        let file = CacheFile {
            format: CACHE_FORMAT.to_string(),
            version: CACHE_VERSION,
            root: catalog.root.clone(),
            built_at: catalog.built_at,
            entries: catalog.entries.clone(),
        };
        let data = serde_json::to_string(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Rename over the old artifact so readers never see a torn file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Delete the artifact, forcing a full rebuild on next load.
    pub fn invalidate(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed catalog cache {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DocType;

    fn sample_catalog(root: &Path) -> Catalog {
        Catalog::new(
            root,
            vec![
                CatalogEntry {
                    name: "2024年登革热防控方案.pdf".into(),
                    path: root.join("卫生/公共卫生团组/2024年登革热防控方案.pdf"),
                    doc_type: DocType::Pdf,
                    department: "公共卫生团组".into(),
                    year: "2024".into(),
                    category_path: "卫生 > 公共卫生团组".into(),
                    content_excerpt: "白纹伊蚊监测\n".into(),
                },
                CatalogEntry {
                    name: "说明.docx".into(),
                    path: root.join("说明.docx"),
                    doc_type: DocType::Docx,
                    department: "通用资源".into(),
                    year: "----".into(),
                    category_path: String::new(),
                    content_excerpt: String::new(),
                },
            ],
        )
    }

    #[test]
    fn test_cache_roundtrip() {
        let temp = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(temp.path().join("index.json"));
        let catalog = sample_catalog(temp.path());

        assert!(cache.save(&catalog));
        let loaded = cache.load(temp.path()).expect("cache hit");
        assert_eq!(loaded, catalog);
    }

    #[test]
    fn test_missing_cache_is_miss() {
        let temp = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(temp.path().join("index.json"));
        assert!(cache.load(temp.path()).is_none());
    }

    #[test]
    fn test_corrupt_cache_is_miss() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("index.json");
        fs::write(&path, b"\x80\x04not json").unwrap();
        let cache = IndexCache::new(&path);
        assert!(cache.load(temp.path()).is_none());
    }

    #[test]
    fn test_version_mismatch_is_miss() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("index.json");
        let cache = IndexCache::new(&path);
        assert!(cache.save(&sample_catalog(temp.path())));

        let data = fs::read_to_string(&path).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&data).unwrap();
        value["version"] = serde_json::json!(CACHE_VERSION + 1);
        fs::write(&path, value.to_string()).unwrap();

        assert!(cache.load(temp.path()).is_none());
    }

    #[test]
    fn test_root_mismatch_is_miss() {
        let temp = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(temp.path().join("index.json"));
        assert!(cache.save(&sample_catalog(temp.path())));
        assert!(cache.load(&temp.path().join("other")).is_none());
    }

    #[test]
    fn test_save_failure_is_swallowed() {
        let temp = tempfile::tempdir().unwrap();
        // The cache path is an existing directory, so the rename must fail.
        let dir = temp.path().join("occupied");
        fs::create_dir_all(dir.join("child")).unwrap();
        let cache = IndexCache::new(&dir);
        assert!(!cache.save(&sample_catalog(temp.path())));
    }

    #[test]
    fn test_invalidate() {
        let temp = tempfile::tempdir().unwrap();
        let cache = IndexCache::new(temp.path().join("index.json"));
        assert!(cache.save(&sample_catalog(temp.path())));
        cache.invalidate().unwrap();
        assert!(!cache.path().exists());
        // Second removal is a no-op.
        cache.invalidate().unwrap();
        assert!(cache.load(temp.path()).is_none());
    }
}
