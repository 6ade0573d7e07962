use crate::engine::error::TreeError;
use crate::engine::letter::{ALPHABET_LEN, Letter};

const REJECTED_SYMBOLS: &[char] = &['\'', '.', '-', '_', '/', '(', ')'];

/// Returns false for any text containing a digit or one of `' . - _ / ( )`.
///
/// Used both for dictionary insertion and for filtering live keystrokes, so it
/// deliberately says nothing about letters outside `a..=z`.
pub fn word_is_valid(word: &str) -> bool {
    !word
        .chars()
        .any(|ch| ch.is_ascii_digit() || REJECTED_SYMBOLS.contains(&ch))
}

/// Trainable prefix tree.
///
/// Every node counts the words that continue below it (`size`, starting at 1
/// for the empty suffix) and accumulates the training weight credited to the
/// prefix ending at it (`popularity`).
#[derive(Clone, Debug)]
pub struct PrefixTree {
    size: u32,
    popularity: u32,
    terminal: bool,
    children: [Option<Box<PrefixTree>>; ALPHABET_LEN],
}

impl Default for PrefixTree {
    fn default() -> Self {
        Self {
            size: 1,
            popularity: 0,
            terminal: false,
            children: Default::default(),
        }
    }
}

impl PrefixTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `word` (case-insensitive). Returns `Ok(false)` if it was already known.
    pub fn insert(&mut self, word: &str) -> Result<bool, TreeError> {
        let letters = spell(word).ok_or_else(|| TreeError::InvalidWord(word.to_string()))?;
        if letters.is_empty() || self.node(&letters).is_some_and(|node| node.terminal) {
            return Ok(false);
        }
        self.insert_letters(&letters);
        Ok(true)
    }

    fn insert_letters(&mut self, letters: &[Letter]) {
        let Some((first, rest)) = letters.split_first() else {
            self.terminal = true;
            return;
        };
        self.children[first.index()]
            .get_or_insert_with(Box::default)
            .insert_letters(rest);
        self.size += 1;
    }

    /// Credits `amount` to this node and to every node along `suffix`.
    ///
    /// The whole path must already exist; otherwise nothing is modified.
    pub fn train(&mut self, suffix: &str, amount: u32) -> Result<(), TreeError> {
        let untrained = || TreeError::UntrainedPath(suffix.to_string());
        let letters = spell(suffix).ok_or_else(untrained)?;
        if self.node(&letters).is_none() {
            return Err(untrained());
        }
        self.train_letters(&letters, amount);
        Ok(())
    }

    fn train_letters(&mut self, letters: &[Letter], amount: u32) {
        self.popularity = self.popularity.saturating_add(amount);
        if let Some((first, rest)) = letters.split_first()
            && let Some(child) = self.children[first.index()].as_deref_mut()
        {
            child.train_letters(rest, amount);
        }
    }

    pub fn child_subtree_size(&self, letter: char) -> u32 {
        self.descend(letter).map_or(0, PrefixTree::size)
    }

    pub fn child_popularity(&self, letter: char) -> u32 {
        self.descend(letter).map_or(0, PrefixTree::popularity)
    }

    /// `None` is the normal "no known word continues with this letter" signal.
    pub fn descend(&self, letter: char) -> Option<&PrefixTree> {
        Letter::from_char(letter).and_then(|l| self.child(l))
    }

    pub fn child(&self, letter: Letter) -> Option<&PrefixTree> {
        self.children[letter.index()].as_deref()
    }

    pub fn node(&self, path: &[Letter]) -> Option<&PrefixTree> {
        path.iter().try_fold(self, |node, &letter| node.child(letter))
    }

    pub fn contains(&self, word: &str) -> bool {
        spell(word)
            .and_then(|letters| self.node(&letters).map(|node| node.terminal))
            .unwrap_or(false)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn popularity(&self) -> u32 {
        self.popularity
    }

    pub fn word_count(&self) -> u32 {
        self.size - 1
    }
}

/// Maps a word to its path of letters, or `None` if the tree cannot hold it.
pub fn spell(word: &str) -> Option<Vec<Letter>> {
    if !word_is_valid(word) {
        return None;
    }
    word.chars().map(Letter::from_char).collect()
}
