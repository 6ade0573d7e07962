//! In-memory [`WordStore`] for unit tests.

use crate::engine::aggressiveness::AggressivenessController;
use crate::engine::sublanguage::Sublanguage;
use crate::store::json_store::prune_least_recent;
use crate::store::schema::WordRecord;
use crate::store::{Result, StoreError, WordStore};

/// Records every write and can be told to reject them.
#[derive(Default)]
pub struct MemoryStore {
    pub records: Vec<WordRecord>,
    pub sublanguage: Sublanguage,
    pub essentials: Option<AggressivenessController>,
    pub new_words: Vec<String>,
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn with_words(words: &[(&str, u32)]) -> Self {
        Self {
            records: words
                .iter()
                .map(|&(w, usage)| WordRecord::new(w, usage, 1_000))
                .collect(),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn record(&self, word: &str) -> Option<&WordRecord> {
        self.records.iter().find(|r| r.word == word)
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        } else {
            Ok(())
        }
    }
}

impl WordStore for MemoryStore {
    fn load_words(&self) -> Result<Vec<WordRecord>> {
        Ok(self.records.clone())
    }

    fn load_sublanguage(&self) -> Result<Sublanguage> {
        Ok(self.sublanguage.clone())
    }

    fn update_word(&mut self, record: &WordRecord) -> Result<()> {
        self.check()?;
        self.records.retain(|r| r.word != record.word);
        self.records.push(record.clone());
        Ok(())
    }

    fn add_new_word(&mut self, word: &str) -> Result<()> {
        self.check()?;
        self.new_words.push(word.to_string());
        if self.record(word).is_none() {
            self.records.push(WordRecord::unused(word));
        }
        Ok(())
    }

    fn load_essentials(&self) -> Result<AggressivenessController> {
        Ok(self.essentials.clone().unwrap_or_default())
    }

    fn save_essentials(&mut self, controller: &AggressivenessController) -> Result<()> {
        self.check()?;
        self.essentials = Some(controller.clone());
        Ok(())
    }

    fn prune_stale_words(&mut self, threshold: usize, fraction: f64) -> Result<usize> {
        self.check()?;
        Ok(prune_least_recent(&mut self.records, threshold, fraction))
    }
}
