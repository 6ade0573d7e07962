use chrono::Utc;
use serde::{Deserialize, Serialize};

const MAX_RECENT: usize = 32;

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Usage of a single word: how often it was typed and when.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordStatistics {
    usage_count: u32,
    /// Epoch milliseconds, most recent first.
    timestamps: Vec<i64>,
}

impl WordStatistics {
    /// A word seen for the first time, right now.
    pub fn new() -> Self {
        Self::at(now_millis())
    }

    pub fn at(timestamp: i64) -> Self {
        Self::from_persisted(1, timestamp)
    }

    /// Rebuilds statistics from a stored `(usage, timestamp)` pair.
    pub fn from_persisted(usage_count: u32, timestamp: i64) -> Self {
        Self {
            usage_count,
            timestamps: vec![timestamp],
        }
    }

    pub fn record_occurrence(&mut self) {
        self.record_occurrence_at(now_millis());
    }

    pub fn record_occurrence_at(&mut self, timestamp: i64) {
        self.usage_count = self.usage_count.saturating_add(1);
        self.timestamps.insert(0, timestamp);
        self.timestamps.truncate(MAX_RECENT);
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamps.first().copied().unwrap_or_default()
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }
}

impl Default for WordStatistics {
    fn default() -> Self {
        Self::new()
    }
}
