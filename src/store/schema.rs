use serde::{Deserialize, Serialize};

use crate::engine::aggressiveness::AggressivenessController;
use crate::engine::sublanguage::Sublanguage;

pub const SCHEMA_VERSION: u32 = 1;

/// One stored vocabulary row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub word: String,
    pub usage: u32,
    /// Epoch milliseconds of the last use, 0 for never.
    pub timestamp: i64,
}

impl WordRecord {
    pub fn new(word: impl Into<String>, usage: u32, timestamp: i64) -> Self {
        Self {
            word: word.into(),
            usage,
            timestamp,
        }
    }

    pub fn unused(word: impl Into<String>) -> Self {
        Self::new(word, 0, 0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VocabularyData {
    pub schema_version: u32,
    pub words: Vec<WordRecord>,
}

impl Default for VocabularyData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            words: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SublanguageData {
    pub schema_version: u32,
    pub markers: Sublanguage,
}

impl Default for SublanguageData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            markers: Sublanguage::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EssentialsData {
    pub schema_version: u32,
    pub controller: AggressivenessController,
}

impl Default for EssentialsData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            controller: AggressivenessController::default(),
        }
    }
}

/// Implemented by every stored document so stale ones can be discarded.
pub trait Versioned {
    fn schema_version(&self) -> u32;

    fn needs_reset(&self) -> bool {
        self.schema_version() != SCHEMA_VERSION
    }
}

impl Versioned for VocabularyData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Versioned for SublanguageData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}

impl Versioned for EssentialsData {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }
}
