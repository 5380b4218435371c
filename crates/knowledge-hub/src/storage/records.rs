//! Per-client record log: one JSON file, one table per collection
//!
//! Layout: `{"<collection>": {"1": {"url": ..., "title": ...}, ...}}`.
//! Every operation reads the file and every mutation rewrites it through a
//! temp file, so several collections of the same client can share it.

use std::collections::BTreeMap;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::types::{IngestionRecord, RecordMatch};

type Table = BTreeMap<u64, IngestionRecord>;
type Tables = BTreeMap<String, Table>;

/// JSON record log shared by all collections of a client
#[derive(Debug, Clone)]
pub struct RecordLog {
    path: PathBuf,
}

impl RecordLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Tables> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Tables::new()),
            Err(e) => {
                return Err(Error::record_log(format!(
                    "Cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(Tables::new());
        }
        serde_json::from_str(&raw).map_err(|e| {
            Error::record_log(format!("Corrupt record log {}: {}", self.path.display(), e))
        })
    }

    fn store(&self, tables: &Tables) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let write = || -> std::io::Result<()> {
            std::fs::create_dir_all(dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            {
                let mut writer = BufWriter::new(tmp.as_file_mut());
                serde_json::to_writer(&mut writer, tables)?;
                writer.flush()?;
            }
            tmp.persist(&self.path).map_err(|e| e.error)?;
            Ok(())
        };
        write().map_err(|e| {
            Error::record_log(format!("Cannot write {}: {}", self.path.display(), e))
        })
    }

    /// Records of one table in insertion order
    pub fn records(&self, table: &str) -> Result<Vec<IngestionRecord>> {
        Ok(self
            .load()?
            .remove(table)
            .map(|t| t.into_values().collect())
            .unwrap_or_default())
    }

    /// True if any record of the table matches any field of `query`
    pub fn contains(&self, table: &str, query: &RecordMatch) -> Result<bool> {
        Ok(self
            .load()?
            .get(table)
            .is_some_and(|t| t.values().any(|record| query.matches(record))))
    }

    /// Append a record, returning its id within the table
    pub fn insert(&self, table: &str, record: IngestionRecord) -> Result<u64> {
        let mut tables = self.load()?;
        let entries = tables.entry(table.to_string()).or_default();
        let id = entries.keys().next_back().map_or(1, |last| last + 1);
        entries.insert(id, record);
        self.store(&tables)?;
        Ok(id)
    }

    /// Remove a table, returning whether it existed
    pub fn drop_table(&self, table: &str) -> Result<bool> {
        let mut tables = self.load()?;
        if tables.remove(table).is_none() {
            return Ok(false);
        }
        self.store(&tables)?;
        Ok(true)
    }

    /// Names of every table in the log
    pub fn tables(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}
