//! Rolling window of daily portfolio values.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DEFAULT_MAX_POINTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub date: NaiveDate,
    pub value: f64,
}

/// Persistence for the history window.
pub trait HistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<HistoryRecord>>;
    fn save(&self, records: &[HistoryRecord]) -> Result<()>;
}

/// Keeps at most `max_points` records, one per calendar day, oldest first.
pub struct HistoryTracker<S, R = StdRng> {
    store: S,
    max_points: usize,
    rng: R,
}

impl<S: HistoryStore> HistoryTracker<S, StdRng> {
    pub fn new(store: S, max_points: usize) -> Self {
        Self::with_rng(store, max_points, StdRng::from_os_rng())
    }
}

impl<S: HistoryStore, R: Rng> HistoryTracker<S, R> {
    pub fn with_rng(store: S, max_points: usize, rng: R) -> Self {
        Self {
            store,
            max_points: max_points.max(1),
            rng,
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Stored window, without recording anything.
    pub fn window(&self) -> Vec<HistoryRecord> {
        let mut records = normalize(self.load_or_empty());
        truncate_to_latest(&mut records, self.max_points);
        records
    }

    /// Records `value` for today's local date.
    pub fn record_value(&mut self, value: f64) -> Result<Vec<HistoryRecord>> {
        self.record_value_on(Local::now().date_naive(), value)
    }

    /// Records `value` for `today`, replacing any earlier value for that day.
    ///
    /// A window shorter than `max_points` is padded with placeholder days
    /// before the oldest record (see [`backfill`]). The resulting window is
    /// saved and returned.
    pub fn record_value_on(&mut self, today: NaiveDate, value: f64) -> Result<Vec<HistoryRecord>> {
        let mut stored = self.load_or_empty();
        stored.retain(|r| r.date != today);
        stored.push(HistoryRecord { date: today, value });

        let mut records = normalize(stored);
        backfill(&mut records, self.max_points, &mut self.rng);
        truncate_to_latest(&mut records, self.max_points);

        self.store.save(&records)?;
        debug!(%today, value, points = records.len(), "Recorded portfolio value");
        Ok(records)
    }

    fn load_or_empty(&self) -> Vec<HistoryRecord> {
        self.store.load().unwrap_or_else(|e| {
            warn!(error = %e, "History unreadable, starting from empty");
            Vec::new()
        })
    }
}

/// Sorts by date, keeping the last record seen for each day.
fn normalize(records: Vec<HistoryRecord>) -> Vec<HistoryRecord> {
    records
        .into_iter()
        .map(|r| (r.date, r.value))
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(date, value)| HistoryRecord { date, value })
        .collect()
}

fn truncate_to_latest(records: &mut Vec<HistoryRecord>, max_points: usize) {
    let excess = records.len().saturating_sub(max_points);
    records.drain(..excess);
}

/// Pads a short window with placeholder days walking back from the oldest
/// record. Each placeholder is the following day's value scaled by a random
/// factor in `[0.99, 1.01]`.
///
/// Placeholders are only a cold-start filler for the trend chart. They are not
/// market data.
pub fn backfill<R: Rng>(records: &mut Vec<HistoryRecord>, max_points: usize, rng: &mut R) {
    while records.len() < max_points {
        let Some(oldest) = records.first() else {
            return;
        };
        let Some(date) = oldest.date.pred_opt() else {
            return;
        };
        let value = oldest.value * rng.random_range(0.99..=1.01);
        debug!(%date, value, "Backfilling placeholder history");
        records.insert(0, HistoryRecord { date, value });
    }
}
