use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::{debug, info, warn};

use crate::engine::error::{EngineError, Result, TreeError};
use crate::engine::letter::Letter;
use crate::engine::prefix_tree::{PrefixTree, spell, word_is_valid};
use crate::engine::sublanguage::Sublanguage;
use crate::engine::word_stats::WordStatistics;
use crate::store::schema::WordRecord;
use crate::store::{StoreError, WordStore};

pub const DEFAULT_PERSONALIZATION_FACTOR: f64 = 1.0;

/// Probability of each next letter. Empty when there is nothing to predict.
pub type Predictions = HashMap<char, f64>;

/// Where the word being typed sits in the prefix tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cursor {
    /// Path from the root spelled by the letters typed so far.
    Known(Vec<Letter>),
    /// The typed prefix matches no known word.
    Unknown,
}

impl Cursor {
    fn root() -> Self {
        Cursor::Known(Vec::new())
    }
}

/// What a word boundary did with the composed word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WordOutcome {
    /// Nothing was being composed.
    Empty,
    /// The word cannot be stored in the tree and was dropped.
    Skipped,
    /// A known word; its path was trained.
    Trained,
    /// A new word was added to the vocabulary.
    Learned,
}

/// Personalized next-letter predictor for one editing session.
#[derive(Clone, Debug)]
pub struct PredictionEngine {
    root: PrefixTree,
    knowledge: HashMap<String, WordStatistics>,
    sublanguage: Sublanguage,
    cursor: Cursor,
    composing: String,
    total_trained_words: u64,
    personalization_factor: f64,
    idle: bool,
}

impl Default for PredictionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONALIZATION_FACTOR)
    }
}

impl PredictionEngine {
    pub fn new(personalization_factor: f64) -> Self {
        Self {
            root: PrefixTree::new(),
            knowledge: HashMap::new(),
            sublanguage: Sublanguage::new(),
            cursor: Cursor::root(),
            composing: String::new(),
            total_trained_words: 0,
            personalization_factor,
            idle: false,
        }
    }

    /// Loads the vocabulary and sublanguage from `store` and replays the
    /// stored usage into the tree.
    pub fn load<S: WordStore + ?Sized>(
        store: &S,
        personalization_factor: f64,
    ) -> std::result::Result<Self, StoreError> {
        let records = store.load_words()?;
        let sublanguage = store.load_sublanguage()?;
        let engine = Self::from_records(records, sublanguage, personalization_factor);
        info!(
            words = engine.vocabulary_size(),
            trained = engine.total_trained_words,
            "prediction engine loaded"
        );
        Ok(engine)
    }

    pub fn from_records(
        records: impl IntoIterator<Item = WordRecord>,
        sublanguage: Sublanguage,
        personalization_factor: f64,
    ) -> Self {
        let mut engine = Self::new(personalization_factor);
        engine.sublanguage = sublanguage;

        for record in records {
            let word = record.word.to_lowercase();
            if let Err(e) = engine.root.insert(&word) {
                warn!("skipping stored word: {e}");
                continue;
            }
            engine.knowledge.insert(
                word,
                WordStatistics::from_persisted(record.usage, record.timestamp),
            );
        }

        for (word, stats) in &engine.knowledge {
            match engine.root.train(word, stats.usage_count()) {
                Ok(()) => engine.total_trained_words += u64::from(stats.usage_count()),
                Err(e) => warn!("skipping stored usage: {e}"),
            }
        }
        engine
    }

    /// Feeds one typed character. Returns false if the character was ignored.
    pub fn on_character_typed(&mut self, ch: char) -> bool {
        let mut buf = [0u8; 4];
        if !word_is_valid(ch.encode_utf8(&mut buf)) {
            debug!(%ch, "character ignored");
            return false;
        }
        self.composing.push(ch);

        self.cursor = match std::mem::replace(&mut self.cursor, Cursor::Unknown) {
            // The caret is not at the start of this word, so no path applies
            _ if self.idle => Cursor::Unknown,
            Cursor::Known(mut path) => {
                let next = Letter::from_char(ch).filter(|&letter| {
                    self.root
                        .node(&path)
                        .and_then(|node| node.child(letter))
                        .is_some()
                });
                match next {
                    Some(letter) => {
                        path.push(letter);
                        Cursor::Known(path)
                    }
                    None => {
                        debug!(word = %self.composing, "unknown word detected");
                        Cursor::Unknown
                    }
                }
            }
            Cursor::Unknown => Cursor::Unknown,
        };
        true
    }

    fn cursor_node(&self) -> Option<&PrefixTree> {
        match &self.cursor {
            Cursor::Known(path) => self.root.node(path),
            Cursor::Unknown => None,
        }
    }

    /// Share of the evaluation given to personal popularity, in `[0, 1]`.
    pub fn usage_ratio(&self) -> f64 {
        let ratio = self.personalization_factor * self.total_trained_words as f64
            / f64::from(self.root.size());
        ratio.clamp(0.0, 1.0)
    }

    fn evaluate(node: &PrefixTree, letter: char, usage_ratio: f64) -> f64 {
        usage_ratio * f64::from(node.child_popularity(letter))
            + (1.0 - usage_ratio) * f64::from(node.child_subtree_size(letter))
    }

    /// Blended popularity/structure score of `letter` as the next character.
    pub fn evaluation(&self, letter: char) -> f64 {
        self.cursor_node()
            .map_or(0.0, |node| Self::evaluate(node, letter, self.usage_ratio()))
    }

    pub fn predict_next_letters(&self) -> Predictions {
        if self.idle {
            return Predictions::new();
        }
        let Some(node) = self.cursor_node() else {
            return Predictions::new();
        };

        let usage_ratio = self.usage_ratio();
        let evaluations: Vec<(char, f64)> = Letter::all()
            .map(|letter| {
                let ch = letter.to_char();
                (ch, Self::evaluate(node, ch, usage_ratio))
            })
            .collect();
        let sum: f64 = evaluations.iter().map(|&(_, e)| e).sum();

        if sum == 0.0 {
            return evaluations.into_iter().map(|(ch, _)| (ch, 0.0)).collect();
        }

        let context = self.composing.to_lowercase();
        evaluations
            .into_iter()
            .map(|(ch, evaluation)| {
                let probability = if self.sublanguage.is_forced(&context, ch) {
                    1.0
                } else {
                    (evaluation / sum * 100.0).round() / 100.0
                };
                (ch, probability)
            })
            .collect()
    }

    /// Closes the composed word: records its usage and either trains its path,
    /// when the tree already holds it, or adds it to the vocabulary.
    ///
    /// In-memory state is fully updated before `store` is notified of a new
    /// word, so a storage error leaves the engine consistent.
    pub fn on_word_boundary<S: WordStore + ?Sized>(&mut self, store: &mut S) -> Result<WordOutcome> {
        if self.composing.is_empty() {
            return Ok(WordOutcome::Empty);
        }
        let word = self.composing.to_lowercase();
        self.reset_word();

        let Some(letters) = spell(&word) else {
            debug!(%word, "word cannot be learned, skipped");
            return Ok(WordOutcome::Skipped);
        };

        // The tree is updated first so a failure leaves the statistics untouched
        let trained = self.root.node(&letters).is_some();
        if trained {
            self.root.train(&word, 1)?;
        } else {
            self.root.insert(&word)?;
        }

        let was_known = self.knowledge.contains_key(&word);
        match self.knowledge.entry(word.clone()) {
            Entry::Occupied(entry) => entry.into_mut().record_occurrence(),
            Entry::Vacant(entry) => {
                entry.insert(WordStatistics::new());
            }
        }
        self.total_trained_words += 1;

        if trained {
            return Ok(WordOutcome::Trained);
        }
        info!(%word, "new word added to vocabulary");
        if !was_known {
            notify_new_word(store, &word)?;
        }
        Ok(WordOutcome::Learned)
    }

    fn reset_word(&mut self) {
        self.composing.clear();
        self.cursor = Cursor::root();
    }

    /// The user rejected the prediction for the current word.
    pub fn cancel_prediction(&mut self) {
        self.reset_word();
        self.idle = true;
    }

    /// The caret re-entered a predictable context.
    pub fn resume(&mut self) {
        self.idle = false;
        self.reset_word();
    }

    /// The caret left a predictable context.
    pub fn force_idle(&mut self) {
        self.composing.clear();
        self.idle = true;
    }

    /// Rebuilds the cursor from a word already in the text, e.g. after a
    /// backspace lands inside it.
    pub fn retype(&mut self, word: &str) {
        self.resume();
        for ch in word.chars() {
            self.on_character_typed(ch);
        }
    }

    /// Adds free-form text the user accepted without going through
    /// [`on_word_boundary`](Self::on_word_boundary).
    ///
    /// Statistics start over even for a known word, and the tree is not
    /// trained, so word usage and tree popularity can drift apart here.
    pub fn learn_word<S: WordStore + ?Sized>(&mut self, new_word: &str, store: &mut S) -> Result<()> {
        let word = new_word.to_lowercase();
        if word.is_empty() {
            return Err(TreeError::InvalidWord(word).into());
        }
        let was_known = self.knowledge.contains_key(&word);
        self.root.insert(&word)?;
        self.knowledge.insert(word.clone(), WordStatistics::new());
        info!(%word, "learned word from accepted text");

        if !was_known {
            notify_new_word(store, &word)?;
        }
        Ok(())
    }

    /// Pushes every used word's statistics to `store`. Returns how many.
    pub fn persist<S: WordStore + ?Sized>(&self, store: &mut S) -> std::result::Result<usize, StoreError> {
        let mut records: Vec<WordRecord> = self
            .knowledge
            .iter()
            .filter(|(_, stats)| stats.usage_count() > 0)
            .map(|(word, stats)| WordRecord::new(word.clone(), stats.usage_count(), stats.timestamp()))
            .collect();
        records.sort_by(|a, b| a.word.cmp(&b.word));

        store.update_words(&records)?;
        debug!(words = records.len(), "prediction state saved");
        Ok(records.len())
    }

    pub fn composing(&self) -> &str {
        &self.composing
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn is_unknown(&self) -> bool {
        self.cursor == Cursor::Unknown
    }

    pub fn is_idle(&self) -> bool {
        self.idle
    }

    pub fn total_trained_words(&self) -> u64 {
        self.total_trained_words
    }

    pub fn personalization_factor(&self) -> f64 {
        self.personalization_factor
    }

    pub fn root(&self) -> &PrefixTree {
        &self.root
    }

    pub fn statistics(&self, word: &str) -> Option<&WordStatistics> {
        self.knowledge.get(&word.to_lowercase())
    }

    pub fn vocabulary_size(&self) -> usize {
        self.knowledge.len()
    }
}

fn notify_new_word<S: WordStore + ?Sized>(store: &mut S, word: &str) -> Result<()> {
    store.add_new_word(word).map_err(|source| {
        warn!(%word, "failed to store new word: {source}");
        EngineError::Storage {
            word: word.to_string(),
            source,
        }
    })
}
