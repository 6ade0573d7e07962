use tracing::{debug, info};

use crate::config::Config;
use crate::engine::aggressiveness::AggressivenessController;
use crate::engine::error::{EngineError, Result, TreeError};
use crate::engine::predictor::{PredictionEngine, WordOutcome};
use crate::store::{StoreError, WordStore};

/// How the keyboard should present its letter keys after an input event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Highlight {
    /// Show every key at full size.
    Reset,
    /// Only these letters are likely next, alphabetically.
    Probable(Vec<char>),
}

/// Counts reported when a session is closed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloseSummary {
    pub words_saved: usize,
    pub words_pruned: usize,
}

pub fn is_word_separator(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '.' | ',' | ';' | ':' | '!' | '?' | '"')
}

/// Text after the last separator in `before_caret`.
pub fn last_word(before_caret: &str) -> &str {
    match before_caret.rfind(is_word_separator) {
        Some(i) => {
            let sep_len = before_caret[i..].chars().next().map_or(1, char::len_utf8);
            &before_caret[i + sep_len..]
        }
        None => before_caret,
    }
}

/// One editing session: routes keyboard events to the predictor and the
/// aggressiveness controller, and persists both on close.
pub struct TypingSession<S: WordStore> {
    engine: PredictionEngine,
    controller: AggressivenessController,
    store: S,
    prediction_cancelled: bool,
    prune_threshold: usize,
    prune_fraction: f64,
}

impl<S: WordStore> TypingSession<S> {
    pub fn open(store: S, config: &Config) -> std::result::Result<Self, StoreError> {
        let engine = PredictionEngine::load(&store, config.personalization_factor)?;
        let controller = store
            .load_essentials()?
            .with_success_threshold(config.success_threshold);
        debug!(k = controller.candidate_set_size(), "session opened");
        Ok(Self {
            engine,
            controller,
            store,
            prediction_cancelled: false,
            prune_threshold: config.prune_threshold,
            prune_fraction: config.prune_fraction,
        })
    }

    pub fn highlight(&self) -> Highlight {
        let predictions = self.engine.predict_next_letters();
        let letters = self.controller.probable_letters(&predictions);
        if letters.is_empty() {
            Highlight::Reset
        } else {
            Highlight::Probable(letters)
        }
    }

    pub fn letter(&mut self, ch: char) -> Highlight {
        self.engine.on_character_typed(ch);
        self.highlight()
    }

    /// A separator closed the word ending at the caret.
    ///
    /// If the prediction was cancelled during this word, the text the user
    /// actually wrote (`last_word`) is learned as-is and the attempt does not
    /// count as a success. The engine is ready for the next word even when
    /// this returns an error.
    pub fn word_separator(&mut self, last_word: &str) -> Result<WordOutcome> {
        let cancelled = std::mem::take(&mut self.prediction_cancelled);
        let outcome = if cancelled {
            self.learn_written_word(last_word)
        } else {
            self.engine.on_word_boundary(&mut self.store)
        };
        self.engine.resume();

        let outcome = outcome?;
        if !cancelled && outcome != WordOutcome::Empty {
            self.controller.on_prediction_succeeded();
        }
        Ok(outcome)
    }

    fn learn_written_word(&mut self, word: &str) -> Result<WordOutcome> {
        if word.is_empty() {
            return Ok(WordOutcome::Empty);
        }
        match self.engine.learn_word(word, &mut self.store) {
            Ok(()) => Ok(WordOutcome::Learned),
            Err(EngineError::Tree(TreeError::InvalidWord(word))) => {
                debug!(%word, "written word cannot be learned, skipped");
                Ok(WordOutcome::Skipped)
            }
            Err(e) => Err(e),
        }
    }

    /// Adds a word the user accepted outside the normal typing flow.
    pub fn learn(&mut self, word: &str) -> Result<()> {
        self.engine.learn_word(word, &mut self.store)
    }

    /// The user swiped the prediction away.
    pub fn cancel(&mut self) {
        self.prediction_cancelled = true;
        self.engine.cancel_prediction();
        self.controller.on_prediction_failed();
        info!(k = self.controller.candidate_set_size(), "prediction cancelled");
    }

    /// Backspace was pressed; `before_caret` is the text left before the caret.
    pub fn backspace(&mut self, before_caret: &str) -> Highlight {
        match before_caret.chars().next_back() {
            Some(ch) if !is_word_separator(ch) => {
                self.engine.retype(last_word(before_caret));
                self.highlight()
            }
            _ => {
                self.engine.resume();
                Highlight::Reset
            }
        }
    }

    /// The caret moved; `predictable` is false inside existing words.
    pub fn caret_moved(&mut self, predictable: bool) {
        if predictable {
            self.engine.resume();
        } else {
            self.engine.force_idle();
        }
    }

    /// Saves word statistics and controller state, then prunes the vocabulary.
    pub fn close(&mut self) -> std::result::Result<CloseSummary, StoreError> {
        let words_saved = self.engine.persist(&mut self.store)?;
        self.store.save_essentials(&self.controller)?;
        let words_pruned = self
            .store
            .prune_stale_words(self.prune_threshold, self.prune_fraction)?;
        info!(words_saved, words_pruned, "session closed");
        Ok(CloseSummary {
            words_saved,
            words_pruned,
        })
    }

    pub fn engine(&self) -> &PredictionEngine {
        &self.engine
    }

    pub fn controller(&self) -> &AggressivenessController {
        &self.controller
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
