use crate::core::history::{HistoryRecord, HistoryStore};
use anyhow::{Result, anyhow};
use std::sync::{Arc, Mutex};

/// In-memory history store. Clones share the same records.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Vec<HistoryRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(records)),
        }
    }

    /// Current contents, or empty if the lock is poisoned.
    pub fn snapshot(&self) -> Vec<HistoryRecord> {
        self.inner
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Vec<HistoryRecord>> {
        let records = self
            .inner
            .lock()
            .map_err(|_| anyhow!("History store lock poisoned"))?;
        Ok(records.clone())
    }

    fn save(&self, records: &[HistoryRecord]) -> Result<()> {
        let mut stored = self
            .inner
            .lock()
            .map_err(|_| anyhow!("History store lock poisoned"))?;
        *stored = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_clones_share_records() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_empty());

        let record = HistoryRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            value: 7500.0,
        };
        store.clone().save(std::slice::from_ref(&record)).unwrap();

        assert_eq!(store.load().unwrap(), vec![record.clone()]);
        assert_eq!(store.snapshot(), vec![record]);
    }
}
