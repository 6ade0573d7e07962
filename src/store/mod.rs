pub mod json_store;
#[cfg(test)]
pub mod memory;
pub mod schema;

use thiserror::Error;

use crate::engine::aggressiveness::AggressivenessController;
use crate::engine::sublanguage::Sublanguage;
use crate::store::schema::WordRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed storage document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Persistence used by the prediction engine and the keyboard session.
///
/// The engine never owns a store; callers pass one in for each operation that
/// reads or writes it.
pub trait WordStore {
    /// Full vocabulary as `(word, usage, timestamp)` records.
    fn load_words(&self) -> Result<Vec<WordRecord>>;

    fn load_sublanguage(&self) -> Result<Sublanguage>;

    /// Insert or replace the record for `record.word`.
    fn update_word(&mut self, record: &WordRecord) -> Result<()>;

    fn update_words(&mut self, records: &[WordRecord]) -> Result<()> {
        for record in records {
            self.update_word(record)?;
        }
        Ok(())
    }

    /// Register a vocabulary word with zero usage and a zero timestamp.
    fn add_new_word(&mut self, word: &str) -> Result<()>;

    fn load_essentials(&self) -> Result<AggressivenessController>;

    fn save_essentials(&mut self, controller: &AggressivenessController) -> Result<()>;

    /// Once the vocabulary holds `threshold` words, drop the least recently
    /// used `fraction` of it. Returns how many words were removed.
    fn prune_stale_words(&mut self, threshold: usize, fraction: f64) -> Result<usize>;
}
