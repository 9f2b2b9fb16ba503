//! The knowledge base: the shared catalog plus the operations users invoke
//! on it (search, download, browse, refresh, dashboard).
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::browse::{self, BrowseError, FolderNode};
use crate::catalog::cache::IndexCache;
use crate::catalog::{Catalog, CatalogEntry, RootState};
use crate::config::Config;
use crate::extractor::{ContentExtractor, OfficeExtractor};
use crate::indexer::IndexBuilder;
use crate::search::{SearchMode, SearchScorer};
use crate::session::{Session, SessionError};
use crate::usage::{UsageAction, UsageEvent, UsageLog, UsageLogError, UsageStats};

#[derive(Error, Debug)]
pub enum KbError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Browse(#[from] BrowseError),

    #[error(transparent)]
    Usage(#[from] UsageLogError),

    #[error("catalog cache error: {0}")]
    Cache(std::io::Error),

    #[error("not an indexed document: {0}")]
    UnknownDocument(PathBuf),

    #[error("destination is the document itself: {0}")]
    SameFile(PathBuf),

    #[error("failed to copy {path}: {source}")]
    Fetch {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where the current catalog came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOrigin {
    Cache,
    Scan,
    MissingRoot,
}

/// Owned search hit, detached from the catalog snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchMatch {
    pub score: u32,
    #[serde(flatten)]
    pub entry: CatalogEntry,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchReport {
    pub query: String,
    pub mode: SearchMode,
    pub expansions: Vec<String>,
    pub matches: Vec<SearchMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSummary {
    pub origin: CatalogOrigin,
    pub root_state: RootState,
    pub documents: usize,
    pub empty_excerpts: usize,
    pub built_at: chrono::DateTime<chrono::Utc>,
}

pub struct KnowledgeBase {
    config: Arc<Config>,
    extractor: Box<dyn ContentExtractor>,
    cache: IndexCache,
    usage: UsageLog,
    state: RwLock<(Arc<Catalog>, CatalogOrigin)>,
}

impl KnowledgeBase {
    /// Open with the office-format extractor configured from `config`.
    pub fn open(config: Arc<Config>) -> Self {
        let extractor = OfficeExtractor::new(config.excerpt);
        Self::with_extractor(config, Box::new(extractor))
    }

    /// Load the cached catalog for the configured root or build a new one.
    pub fn with_extractor(config: Arc<Config>, extractor: Box<dyn ContentExtractor>) -> Self {
        let cache = IndexCache::new(&config.cache_path);
        let usage = UsageLog::new(&config.usage_log_path);
        let root = absolutize(&config.data_dir);

        let kb = Self {
            state: RwLock::new((Arc::new(Catalog::empty(&root)), CatalogOrigin::MissingRoot)),
            config,
            extractor,
            cache,
            usage,
        };

        let loaded = match kb.cache.load(&root) {
            Some(catalog) => (catalog, CatalogOrigin::Cache),
            None => kb.scan(&root),
        };
        kb.publish(loaded.0, loaded.1);
        kb
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current catalog snapshot. Cheap; later refreshes do not affect it.
    pub fn catalog(&self) -> Arc<Catalog> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&guard.0),
            Err(poisoned) => Arc::clone(&poisoned.into_inner().0),
        }
    }

    pub fn summary(&self) -> CatalogSummary {
        let (catalog, origin) = match self.state.read() {
            Ok(guard) => (Arc::clone(&guard.0), guard.1),
            Err(poisoned) => {
                let guard = poisoned.into_inner();
                (Arc::clone(&guard.0), guard.1)
            }
        };
        CatalogSummary {
            origin,
            root_state: catalog.root_state(),
            documents: catalog.len(),
            empty_excerpts: catalog
                .entries
                .iter()
                .filter(|e| e.content_excerpt.is_empty())
                .count(),
            built_at: catalog.built_at,
        }
    }

    fn scan(&self, root: &Path) -> (Catalog, CatalogOrigin) {
        let builder = IndexBuilder::new(root, self.extractor.as_ref(), &self.config.tags);
        match builder.build() {
            Ok(catalog) => {
                self.cache.save(&catalog);
                (catalog, CatalogOrigin::Scan)
            }
            Err(e) => {
                warn!("{e}; serving an empty catalog");
                (Catalog::empty(root), CatalogOrigin::MissingRoot)
            }
        }
    }

    /// Swap in a new catalog. Readers holding the old snapshot keep it.
    fn publish(&self, catalog: Catalog, origin: CatalogOrigin) {
        let next = (Arc::new(catalog), origin);
        match self.state.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn record_login(&self, session: &Session) {
        self.usage.record(session, UsageAction::Login, "", "");
    }

    pub fn search(&self, session: &Session, query: &str, mode: SearchMode) -> SearchReport {
        let catalog = self.catalog();
        let scorer = SearchScorer::new(&self.config.synonyms);
        let results = scorer.search(&catalog.entries, query, mode);

        if !query.is_empty() {
            self.usage.record(
                session,
                UsageAction::Search,
                query,
                &format!("{mode}, {} hits", results.len()),
            );
        }

        SearchReport {
            query: query.to_string(),
            mode,
            expansions: results.expansions,
            matches: results
                .hits
                .iter()
                .map(|h| SearchMatch {
                    score: h.score,
                    entry: h.entry.clone(),
                })
                .collect(),
        }
    }

    /// Copy a catalogued document to `destination`. Directories receive the
    /// file under its own name. Returns the written path.
    pub fn fetch(
        &self,
        session: &Session,
        path: &Path,
        destination: &Path,
    ) -> Result<PathBuf, KbError> {
        let catalog = self.catalog();
        let entry = catalog
            .get(&absolutize(path))
            .ok_or_else(|| KbError::UnknownDocument(path.to_path_buf()))?;

        let target = if destination.is_dir() {
            destination.join(&entry.name)
        } else {
            destination.to_path_buf()
        };
        if is_same_file(&target, &entry.path) {
            return Err(KbError::SameFile(target));
        }
        fs::copy(&entry.path, &target).map_err(|source| KbError::Fetch {
            path: entry.path.clone(),
            source,
        })?;

        self.usage
            .record(session, UsageAction::Download, &entry.name, &entry.category_path);
        Ok(target)
    }

    pub fn browse(&self) -> Result<FolderNode, KbError> {
        let root = self.catalog().root.clone();
        Ok(browse::browse(&root, browse::MAX_DEPTH)?)
    }

    /// Drop the cache and rebuild from disk. Admin only.
    pub fn refresh(&self, session: &Session) -> Result<CatalogSummary, KbError> {
        session.require_admin("refresh")?;

        if let Err(e) = self.cache.invalidate() {
            warn!("Failed to remove catalog cache: {e}");
        }
        let root = absolutize(&self.config.data_dir);
        let (catalog, origin) = self.scan(&root);
        let documents = catalog.len();
        self.publish(catalog, origin);

        info!("Catalog refreshed by {}: {documents} documents", session.username);
        self.usage
            .record(session, UsageAction::Refresh, "", &format!("{documents} documents"));
        Ok(self.summary())
    }

    /// Dashboard numbers. Admin only.
    pub fn usage_stats(&self, session: &Session) -> Result<UsageStats, KbError> {
        session.require_admin("usage statistics")?;
        Ok(self.usage.stats()?)
    }

    /// Newest `limit` usage events, newest first. Admin only.
    pub fn recent_activity(
        &self,
        session: &Session,
        limit: usize,
    ) -> Result<Vec<UsageEvent>, KbError> {
        session.require_admin("usage statistics")?;
        Ok(self.usage.recent(limit)?)
    }

    pub fn clear_cache(&self, session: &Session) -> Result<(), KbError> {
        session.require_admin("clear cache")?;
        self.cache.invalidate().map_err(KbError::Cache)
    }
}

/// Copying a file onto itself truncates it.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
