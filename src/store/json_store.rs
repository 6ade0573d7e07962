use std::fs;
use std::io::Write;
use std::path::PathBuf;

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::engine::aggressiveness::AggressivenessController;
use crate::engine::prefix_tree::spell;
use crate::engine::sublanguage::Sublanguage;
use crate::store::schema::{
    EssentialsData, SublanguageData, Versioned, VocabularyData, WordRecord,
};
use crate::store::{Result, WordStore};

const WORDS_FILE: &str = "words.json";
const SUBLANGUAGE_FILE: &str = "sublanguage.json";
const ESSENTIALS_FILE: &str = "essentials.json";

const SEED_WORDS: &str = include_str!("../../assets/words-en.json");

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// `Ok(None)` when the document is missing or written by another schema.
    fn load<T: DeserializeOwned + Versioned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let data: T = serde_json::from_str(&content)?;
        if data.needs_reset() {
            warn!(
                file = name,
                version = data.schema_version(),
                "ignoring document with stale schema version"
            );
            return Ok(None);
        }
        Ok(Some(data))
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    fn load_vocabulary(&self) -> Result<VocabularyData> {
        match self.load::<VocabularyData>(WORDS_FILE)? {
            Some(data) => Ok(data),
            None => {
                let data = seed_vocabulary();
                info!(words = data.words.len(), "starting from the bundled vocabulary");
                Ok(data)
            }
        }
    }

    pub fn save_sublanguage(&self, sublanguage: &Sublanguage) -> Result<()> {
        let data = SublanguageData {
            markers: sublanguage.clone(),
            ..SublanguageData::default()
        };
        self.save(SUBLANGUAGE_FILE, &data)
    }
}

/// Bundled word list, every entry unused.
fn seed_vocabulary() -> VocabularyData {
    parse_seed(SEED_WORDS)
}

fn parse_seed(json: &str) -> VocabularyData {
    let words: Vec<String> = match serde_json::from_str(json) {
        Ok(words) => words,
        Err(e) => {
            warn!("bundled vocabulary is malformed, starting empty: {e}");
            Vec::new()
        }
    };
    let words = words
        .into_iter()
        .filter(|w| spell(w).is_some_and(|letters| !letters.is_empty()))
        .map(|w| WordRecord::unused(w.to_lowercase()))
        .collect();
    VocabularyData {
        words,
        ..VocabularyData::default()
    }
}

fn upsert(words: &mut Vec<WordRecord>, record: &WordRecord) {
    match words.iter_mut().find(|r| r.word == record.word) {
        Some(existing) => *existing = record.clone(),
        None => words.push(record.clone()),
    }
}

impl WordStore for JsonStore {
    fn load_words(&self) -> Result<Vec<WordRecord>> {
        Ok(self.load_vocabulary()?.words)
    }

    fn load_sublanguage(&self) -> Result<Sublanguage> {
        Ok(self
            .load::<SublanguageData>(SUBLANGUAGE_FILE)?
            .unwrap_or_default()
            .markers)
    }

    fn update_word(&mut self, record: &WordRecord) -> Result<()> {
        self.update_words(std::slice::from_ref(record))
    }

    fn update_words(&mut self, records: &[WordRecord]) -> Result<()> {
        let mut data = self.load_vocabulary()?;
        for record in records {
            upsert(&mut data.words, record);
        }
        self.save(WORDS_FILE, &data)?;
        debug!(updated = records.len(), "saved word statistics");
        Ok(())
    }

    fn add_new_word(&mut self, word: &str) -> Result<()> {
        let mut data = self.load_vocabulary()?;
        if data.words.iter().any(|r| r.word == word) {
            return Ok(());
        }
        data.words.push(WordRecord::unused(word));
        self.save(WORDS_FILE, &data)
    }

    fn load_essentials(&self) -> Result<AggressivenessController> {
        let mut controller = self
            .load::<EssentialsData>(ESSENTIALS_FILE)?
            .unwrap_or_default()
            .controller;
        controller.normalize();
        Ok(controller)
    }

    fn save_essentials(&mut self, controller: &AggressivenessController) -> Result<()> {
        let data = EssentialsData {
            controller: controller.clone(),
            ..EssentialsData::default()
        };
        self.save(ESSENTIALS_FILE, &data)
    }

    fn prune_stale_words(&mut self, threshold: usize, fraction: f64) -> Result<usize> {
        let mut data = self.load_vocabulary()?;
        let removed = prune_least_recent(&mut data.words, threshold, fraction);
        if removed > 0 {
            self.save(WORDS_FILE, &data)?;
            info!(removed, remaining = data.words.len(), "pruned stale vocabulary");
        }
        Ok(removed)
    }
}

/// Removes the `fraction` of `words` with the oldest timestamps once there are
/// at least `threshold` of them.
pub fn prune_least_recent(words: &mut Vec<WordRecord>, threshold: usize, fraction: f64) -> usize {
    if words.len() < threshold || words.is_empty() {
        return 0;
    }
    let count = (words.len() as f64 * fraction.clamp(0.0, 1.0)) as usize;
    if count == 0 {
        return 0;
    }
    words.sort_by_key(|r| r.timestamp);
    *words = words.split_off(count);
    words.sort_by(|a, b| a.word.cmp(&b.word));
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::SCHEMA_VERSION;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_vocabulary_falls_back_to_seed() {
        let (_dir, store) = make_test_store();
        let words = store.load_words().unwrap();
        assert!(!words.is_empty());
        assert!(words.iter().all(|r| r.usage == 0 && r.timestamp == 0));
        assert!(words.iter().all(|r| r.word.chars().all(|c| c.is_ascii_lowercase())));
    }

    #[test]
    fn test_seed_drops_unstorable_entries() {
        let data = parse_seed(r#"["Apple", "r2d2", "", "pear"]"#);
        let words: Vec<&str> = data.words.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["apple", "pear"]);
    }

    #[test]
    fn test_malformed_seed_yields_empty_vocabulary() {
        let data = parse_seed("{ not a list");
        assert!(data.words.is_empty());
        assert_eq!(data.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn test_update_word_upserts() {
        let (_dir, mut store) = make_test_store();
        store.update_word(&WordRecord::new("zyzzyva", 3, 42)).unwrap();
        store.update_word(&WordRecord::new("zyzzyva", 4, 99)).unwrap();

        let words = store.load_words().unwrap();
        let matches: Vec<_> = words.iter().filter(|r| r.word == "zyzzyva").collect();
        assert_eq!(matches, vec![&WordRecord::new("zyzzyva", 4, 99)]);
    }

    #[test]
    fn test_add_new_word_is_idempotent() {
        let (_dir, mut store) = make_test_store();
        store.add_new_word("quokka").unwrap();
        store.add_new_word("quokka").unwrap();
        let words = store.load_words().unwrap();
        assert_eq!(words.iter().filter(|r| r.word == "quokka").count(), 1);
        assert!(words.contains(&WordRecord::unused("quokka")));
    }

    #[test]
    fn test_essentials_round_trip() {
        let (_dir, mut store) = make_test_store();
        assert_eq!(store.load_essentials().unwrap(), AggressivenessController::default());

        let controller = AggressivenessController::from_state(12, 3);
        store.save_essentials(&controller).unwrap();
        assert_eq!(store.load_essentials().unwrap(), controller);
    }

    #[test]
    fn test_sublanguage_round_trip() {
        let (_dir, store) = make_test_store();
        assert!(store.load_sublanguage().unwrap().is_empty());

        let mut sub = Sublanguage::new();
        sub.mark("q", 'u');
        store.save_sublanguage(&sub).unwrap();
        assert_eq!(store.load_sublanguage().unwrap(), sub);
    }

    #[test]
    fn test_stale_schema_is_ignored() {
        let (dir, store) = make_test_store();
        fs::write(
            dir.path().join(ESSENTIALS_FILE),
            r#"{"schema_version": 99, "controller": {"k": 3, "consecutive_successes": 1}}"#,
        )
        .unwrap();
        assert_eq!(store.load_essentials().unwrap(), AggressivenessController::default());
    }

    #[test]
    fn test_corrupt_document_is_an_error() {
        let (dir, store) = make_test_store();
        fs::write(dir.path().join(WORDS_FILE), "{ not json").unwrap();
        assert!(store.load_words().is_err());
    }

    #[test]
    fn test_prune_least_recent() {
        let mut words: Vec<WordRecord> = (0..10)
            .map(|i| WordRecord::new(format!("w{}", (b'a' + i as u8) as char), 1, i))
            .collect();
        assert_eq!(prune_least_recent(&mut words, 11, 0.3), 0);
        assert_eq!(words.len(), 10);

        assert_eq!(prune_least_recent(&mut words, 10, 0.3), 3);
        assert_eq!(words.len(), 7);
        assert!(words.iter().all(|r| r.timestamp >= 3));
    }

    #[test]
    fn test_prune_stale_words_persists() {
        let (_dir, mut store) = make_test_store();
        let records: Vec<WordRecord> = ["alpha", "bravo", "charlie", "delta"]
            .iter()
            .enumerate()
            .map(|(i, w)| WordRecord::new(*w, 1, i as i64 + 1))
            .collect();
        // Write an explicit vocabulary so the seed list does not interfere
        store
            .save(
                WORDS_FILE,
                &VocabularyData {
                    words: records,
                    ..VocabularyData::default()
                },
            )
            .unwrap();

        assert_eq!(store.prune_stale_words(4, 0.5).unwrap(), 2);
        let words: Vec<String> = store.load_words().unwrap().into_iter().map(|r| r.word).collect();
        assert_eq!(words, vec!["charlie", "delta"]);
    }
}
