//! Topic ledger: which topic was published on which date.
//!
//! Stored as a single pretty-printed JSON document. Every mutation rewrites
//! the whole file through a temporary file in the same directory followed by
//! a rename, so a crash leaves either the old or the new ledger on disk.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::domain::{slugify, TopicRecord};
use crate::error::{FinblogError, Result};

const LEDGER_VERSION: u32 = 1;

/// On-disk ledger document
#[derive(Debug, Serialize, Deserialize)]
struct LedgerFile {
    version: u32,
    #[serde(default)]
    records: Vec<TopicRecord>,
}

/// Persisted (date, topic) history
#[derive(Debug)]
pub struct Ledger {
    path: PathBuf,
    /// Sorted by date, dates unique
    records: Vec<TopicRecord>,
}

impl Ledger {
    /// Load the ledger, treating a missing file as empty
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!(path = %path.display(), "No ledger yet, starting empty");
            return Ok(Self {
                path,
                records: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| FinblogError::persistence(&path, format!("read failed: {}", e)))?;

        let file: LedgerFile = serde_json::from_str(&content)
            .map_err(|e| FinblogError::persistence(&path, format!("malformed ledger: {}", e)))?;

        if file.version != LEDGER_VERSION {
            return Err(FinblogError::persistence(
                &path,
                format!("unsupported ledger version {}", file.version),
            ));
        }

        let mut records = file.records;
        records.sort_by_key(|r| r.date);

        let mut seen = HashSet::new();
        if let Some(dup) = records.iter().find(|r| !seen.insert(r.date)) {
            return Err(FinblogError::persistence(
                &path,
                format!("ledger lists {} more than once", dup.date),
            ));
        }

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, sorted by date ascending
    pub fn list(&self) -> &[TopicRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&TopicRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.get(date).is_some()
    }

    pub fn latest(&self) -> Option<&TopicRecord> {
        self.records.last()
    }

    /// The last `n` records by date
    pub fn recent(&self, n: usize) -> &[TopicRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Date for the next post.
    ///
    /// A requested date is returned as-is unless it is already taken. Without
    /// one, the day after the latest record is used, or `today + 1` for an
    /// empty ledger.
    pub fn next_date(&self, requested: Option<NaiveDate>, today: NaiveDate) -> Result<NaiveDate> {
        if let Some(date) = requested {
            if self.contains_date(date) {
                return Err(FinblogError::DuplicateDate(date));
            }
            return Ok(date);
        }

        let base = self.latest().map(|r| r.date).unwrap_or(today);
        base.checked_add_days(Days::new(1))
            .ok_or_else(|| FinblogError::Config(format!("no calendar day after {}", base)))
    }

    /// Most recent use of a topic inside the last `window` records
    fn recent_use(&self, topic: &str, window: usize) -> Option<&TopicRecord> {
        let slug = slugify(topic);
        self.recent(window).iter().rev().find(|r| r.slug == slug)
    }

    /// Most recent use of a topic anywhere in the ledger
    fn last_use(&self, topic: &str) -> Option<NaiveDate> {
        let slug = slugify(topic);
        self.records
            .iter()
            .rev()
            .find(|r| r.slug == slug)
            .map(|r| r.date)
    }

    /// Reject a caller-forced topic that appears in the recency window
    pub fn validate_topic(&self, topic: &str, window: usize) -> Result<()> {
        match self.recent_use(topic, window) {
            Some(record) => Err(FinblogError::TopicConflict {
                topic: topic.to_string(),
                last_used: record.date,
                window,
            }),
            None => Ok(()),
        }
    }

    /// Pick a catalog topic not used within the last `window` records.
    ///
    /// Never-used topics win in catalog order, then the eligible topic whose
    /// last use is oldest. If the window covers the whole catalog, the least
    /// recently used topic is returned anyway.
    pub fn choose_topic(&self, catalog: &[String], window: usize) -> Result<String> {
        let candidates: Vec<&String> = catalog.iter().filter(|t| !t.trim().is_empty()).collect();
        if candidates.is_empty() {
            return Err(FinblogError::Config("topic catalog is empty".to_string()));
        }

        let eligible: Vec<&String> = candidates
            .iter()
            .copied()
            .filter(|t| self.recent_use(t, window).is_none())
            .collect();

        let pool = if eligible.is_empty() {
            warn!(
                window,
                catalog_size = candidates.len(),
                "Every catalog topic is inside the recency window, reusing the least recent"
            );
            &candidates
        } else {
            &eligible
        };

        // min_by_key keeps the first minimum, so never-used topics (None) win in catalog order
        let chosen = pool
            .iter()
            .min_by_key(|t| self.last_use(t))
            .map(|t| t.trim().to_string())
            .ok_or_else(|| FinblogError::Config("topic catalog is empty".to_string()))?;

        debug!(topic = %chosen, "Chose topic");
        Ok(chosen)
    }

    /// Add a record and persist the ledger.
    ///
    /// On a persistence failure the in-memory ledger is left unchanged.
    pub fn record(&mut self, date: NaiveDate, topic: &str) -> Result<TopicRecord> {
        let idx = match self.records.binary_search_by_key(&date, |r| r.date) {
            Ok(_) => return Err(FinblogError::DuplicateDate(date)),
            Err(idx) => idx,
        };

        let record = TopicRecord::new(date, topic.trim());
        self.records.insert(idx, record.clone());

        if let Err(e) = self.save() {
            self.records.remove(idx);
            return Err(e);
        }

        info!(%date, topic = %record.topic, "Recorded topic in ledger");
        Ok(record)
    }

    /// Atomically rewrite the ledger file
    fn save(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let document = LedgerFile {
            version: LEDGER_VERSION,
            records: self.records.clone(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| FinblogError::persistence(&self.path, e))?;

        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| FinblogError::persistence(&self.path, format!("temp file: {}", e)))?;
        temp.write_all(json.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| FinblogError::persistence(&self.path, format!("write failed: {}", e)))?;
        temp.persist(&self.path)
            .map_err(|e| FinblogError::persistence(&self.path, format!("rename failed: {}", e.error)))?;

        Ok(())
    }
}
