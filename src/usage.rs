//! Append-only usage log (CSV) and the admin dashboard numbers derived from it.
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::session::Session;

const HEADER: [&str; 7] = [
    "timestamp",
    "account",
    "name",
    "department",
    "action",
    "target",
    "detail",
];

#[derive(Error, Debug)]
pub enum UsageLogError {
    #[error("usage log io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("usage log csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageAction {
    Login,
    Search,
    Download,
    Refresh,
}

impl fmt::Display for UsageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UsageAction::Login => "login",
            UsageAction::Search => "search",
            UsageAction::Download => "download",
            UsageAction::Refresh => "refresh",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub timestamp: String,
    pub account: String,
    pub name: String,
    pub department: String,
    pub action: UsageAction,
    pub target: String,
    pub detail: String,
}

impl UsageEvent {
    pub fn new(session: &Session, action: UsageAction, target: &str, detail: &str) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            account: session.username.clone(),
            name: session.display_name.clone(),
            department: session.department.clone(),
            action,
            target: target.to_string(),
            detail: detail.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub total: usize,
    pub searches: usize,
    pub downloads: usize,
    pub by_department: BTreeMap<String, usize>,
}

impl UsageStats {
    pub fn from_events(events: &[UsageEvent]) -> Self {
        let mut stats = Self {
            total: events.len(),
            ..Self::default()
        };
        for event in events {
            match event.action {
                UsageAction::Search => stats.searches += 1,
                UsageAction::Download => stats.downloads += 1,
                UsageAction::Login | UsageAction::Refresh => {}
            }
            *stats
                .by_department
                .entry(event.department.clone())
                .or_default() += 1;
        }
        stats
    }
}

#[derive(Debug, Clone)]
pub struct UsageLog {
    path: PathBuf,
}

impl UsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fire-and-forget append; failures are logged and dropped.
    pub fn record(&self, session: &Session, action: UsageAction, target: &str, detail: &str) {
        let event = UsageEvent::new(session, action, target, detail);
        if let Err(e) = self.append(&event) {
            warn!("Failed to append to usage log {}: {e}", self.path.display());
        }
    }

    pub fn append(&self, event: &UsageEvent) -> Result<(), UsageLogError> {
        self.ensure_initialized()?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.serialize(event)?;
        writer.flush()?;
        Ok(())
    }

    /// Make sure the file exists and starts with the expected header.
    /// A file that cannot be parsed is started over.
    fn ensure_initialized(&self) -> Result<(), UsageLogError> {
        if self.path.exists() {
            match self.header_matches() {
                Ok(true) => return Ok(()),
                Ok(false) => warn!(
                    "Usage log {} has an unexpected header, resetting",
                    self.path.display()
                ),
                Err(e) => warn!(
                    "Usage log {} is unreadable ({e}), resetting",
                    self.path.display()
                ),
            }
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(())
    }

    fn header_matches(&self) -> Result<bool, UsageLogError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let headers = reader.headers()?;
        Ok(headers.iter().eq(HEADER))
    }

    /// All events in file order. A missing log is empty; malformed rows
    /// are skipped.
    pub fn read_all(&self) -> Result<Vec<UsageEvent>, UsageLogError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut events = Vec::new();
        for (row, record) in reader.deserialize::<UsageEvent>().enumerate() {
            match record {
                Ok(event) => events.push(event),
                Err(e) => warn!(
                    "Skipping row {} of usage log {}: {e}",
                    row + 1,
                    self.path.display()
                ),
            }
        }
        Ok(events)
    }

    /// Newest `limit` events, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<UsageEvent>, UsageLogError> {
        let mut events = self.read_all()?;
        events.reverse();
        events.truncate(limit);
        Ok(events)
    }

    pub fn stats(&self) -> Result<UsageStats, UsageLogError> {
        Ok(UsageStats::from_events(&self.read_all()?))
    }
}
