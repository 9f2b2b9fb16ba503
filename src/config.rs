/// Configuration module for policykb.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::extractor::ExcerptLimits;
use crate::indexer::TagRules;
use crate::search::SynonymTable;
use crate::session::{UserAccount, default_accounts};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

// ── Default value functions ──────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./search_index.json")
}

fn default_usage_log_path() -> PathBuf {
    PathBuf::from("./usage_log.csv")
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root of the document tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    #[serde(default = "default_usage_log_path")]
    pub usage_log_path: PathBuf,

    #[serde(default)]
    pub tags: TagRules,

    #[serde(default)]
    pub excerpt: ExcerptLimits,

    #[serde(default)]
    pub synonyms: SynonymTable,

    #[serde(default = "default_accounts")]
    pub users: Vec<UserAccount>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_path: default_cache_path(),
            usage_log_path: default_usage_log_path(),
            tags: TagRules::default(),
            excerpt: ExcerptLimits::default(),
            synonyms: SynonymTable::default(),
            users: default_accounts(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is `None`, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template file.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let is_default_path = config_path.is_none();
        let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));

        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            let cfg = Self::default();

            if is_default_path {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {}", path.display()),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {}: {e}", path.display());
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {}", path.display());
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            !self.data_dir.as_os_str().is_empty(),
            "data_dir must not be empty"
        );
        anyhow::ensure!(
            !self.cache_path.as_os_str().is_empty(),
            "cache_path must not be empty"
        );
        anyhow::ensure!(
            !self.tags.department_marker.is_empty(),
            "tags.department_marker must not be empty"
        );
        anyhow::ensure!(
            self.excerpt.pdf_pages > 0
                && self.excerpt.doc_paragraphs > 0
                && self.excerpt.sheet_rows > 0
                && self.excerpt.slides > 0,
            "excerpt limits must be positive"
        );
        let mut names: Vec<&str> = self.users.iter().map(|u| u.username.as_str()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        anyhow::ensure!(names.len() == before, "usernames must be unique");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
