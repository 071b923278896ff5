use crate::core::history::{HistoryRecord, HistoryStore};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const HISTORY_FILE_NAME: &str = "history.json";

/// History persisted as a pretty-printed JSON array of `{date, value}` objects.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<dir>/history.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(HISTORY_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> Result<Vec<HistoryRecord>> {
        if !self.path.exists() {
            debug!("No history file at {}", self.path.display());
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read history file: {}", self.path.display()))?;
        let records: Vec<HistoryRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history file: {}", self.path.display()))?;
        debug!(points = records.len(), "Loaded history");
        Ok(records)
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(records)?;
        // Replaced through a temp file in the same directory.
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write history file: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace history file: {}", self.path.display()))?;
        debug!(points = records.len(), "Saved history to {}", self.path.display());
        Ok(())
    }
}
