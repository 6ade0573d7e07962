use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::engine::letter::Letter;

/// Letters that always continue a given context, whatever the statistics say.
///
/// The context is the lowercase prefix typed so far; `""` is the word start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sublanguage {
    markers: BTreeMap<String, BTreeSet<char>>,
}

impl Sublanguage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `letter` is not one of `a..=z`.
    pub fn mark(&mut self, context: &str, letter: char) -> bool {
        let Some(letter) = Letter::from_char(letter) else {
            return false;
        };
        self.markers
            .entry(context.to_lowercase())
            .or_default()
            .insert(letter.to_char());
        true
    }

    pub fn is_forced(&self, context: &str, letter: char) -> bool {
        self.markers
            .get(context)
            .is_some_and(|letters| letters.contains(&letter.to_ascii_lowercase()))
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
